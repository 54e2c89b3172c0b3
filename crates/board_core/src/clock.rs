use crate::error::{BoardError, BoardResult};
use time::OffsetDateTime;
use time::macros::format_description;

/// Current UTC time as RFC 3339 text with millisecond precision.
///
/// Fixed width, so lexicographic order in the store is chronological order.
pub fn timestamp() -> BoardResult<String> {
    OffsetDateTime::now_utc()
        .format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
        ))
        .map_err(|err| BoardError::StorageFailure(format!("timestamp formatting: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_is_fixed_width_utc() {
        let stamp = timestamp().unwrap();
        assert_eq!(stamp.len(), "2026-01-01T00:00:00.000Z".len());
        assert!(stamp.ends_with('Z'));
        assert_eq!(&stamp[10..11], "T");
    }
}
