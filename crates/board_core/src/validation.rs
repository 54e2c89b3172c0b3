use crate::error::{BoardError, BoardResult};
use crate::schema::{SignatureMethod, SignatureRequest, VoteChoice};
use std::net::IpAddr;

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_DESCRIPTION_CHARS: usize = 10_000;
pub const MAX_COMMENT_CHARS: usize = 2_000;
pub const MAX_TYPED_NAME_CHARS: usize = 200;
pub const MAX_USER_AGENT_CHARS: usize = 512;
/// Drawn and uploaded signatures arrive as data URLs.
pub const MAX_SIGNATURE_DATA_CHARS: usize = 2_000_000;

fn bounded(field: &'static str, value: &str, max: usize) -> BoardResult<()> {
    if value.chars().count() > max {
        return Err(BoardError::invalid(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(())
}

/// Trim, map blank to `None`, enforce the length cap.
fn optional_text(
    field: &'static str,
    value: Option<String>,
    max: usize,
) -> BoardResult<Option<String>> {
    match value.map(|value| value.trim().to_string()) {
        Some(value) if !value.is_empty() => {
            bounded(field, &value, max)?;
            Ok(Some(value))
        }
        _ => Ok(None),
    }
}

pub fn title(value: &str) -> BoardResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(BoardError::invalid("title", "is required"));
    }
    bounded("title", value, MAX_TITLE_CHARS)?;
    Ok(value.to_string())
}

pub fn description(value: Option<String>) -> BoardResult<Option<String>> {
    optional_text("description", value, MAX_DESCRIPTION_CHARS)
}

pub fn comment(value: Option<String>) -> BoardResult<Option<String>> {
    optional_text("comment", value, MAX_COMMENT_CHARS)
}

pub fn vote_choice(value: Option<&str>) -> BoardResult<VoteChoice> {
    match value.map(str::trim) {
        Some(raw) if !raw.is_empty() => Ok(raw.parse()?),
        _ => Err(BoardError::invalid("vote", "is required")),
    }
}

/// A signature request after normalization; `signature_data` is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedSignature {
    pub signature_type: SignatureMethod,
    pub signature_data: String,
    pub typed_name: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

pub fn signature(request: SignatureRequest) -> BoardResult<CheckedSignature> {
    let typed_name = optional_text("typed_name", request.typed_name, MAX_TYPED_NAME_CHARS)?;
    let data = optional_text(
        "signature_data",
        request.signature_data,
        MAX_SIGNATURE_DATA_CHARS,
    )?;

    let signature_data = match request.signature_type {
        SignatureMethod::Typed => {
            let name = typed_name.clone().ok_or_else(|| {
                BoardError::invalid("typed_name", "is required for typed signatures")
            })?;
            data.unwrap_or(name)
        }
        SignatureMethod::Drawn | SignatureMethod::Uploaded => data.ok_or_else(|| {
            BoardError::invalid(
                "signature_data",
                format!("is required for {} signatures", request.signature_type),
            )
        })?,
    };

    let ip_address = match optional_text("ip_address", request.ip_address, 64)? {
        Some(raw) => {
            let parsed: IpAddr = raw.parse().map_err(|_| {
                BoardError::invalid("ip_address", format!("{raw:?} is not an IP address"))
            })?;
            Some(parsed.to_string())
        }
        None => None,
    };

    Ok(CheckedSignature {
        signature_type: request.signature_type,
        signature_data,
        typed_name,
        ip_address,
        user_agent: optional_text("user_agent", request.user_agent, MAX_USER_AGENT_CHARS)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(signature_type: SignatureMethod) -> SignatureRequest {
        SignatureRequest {
            signature_type,
            signature_data: None,
            typed_name: None,
            ip_address: None,
            user_agent: None,
        }
    }

    fn field_of(err: BoardError) -> &'static str {
        match err {
            BoardError::ValidationFailed { field, .. } => field,
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn title_is_trimmed_and_required() {
        assert_eq!(title("  Approve audit  ").unwrap(), "Approve audit");
        assert_eq!(field_of(title("   ").unwrap_err()), "title");
        assert_eq!(field_of(title(&"x".repeat(201)).unwrap_err()), "title");
    }

    #[test]
    fn blank_comment_becomes_none() {
        assert_eq!(comment(Some("   ".to_string())).unwrap(), None);
        assert_eq!(
            comment(Some(" see minutes ".to_string())).unwrap(),
            Some("see minutes".to_string())
        );
    }

    #[test]
    fn vote_choice_requires_known_value() {
        assert_eq!(vote_choice(Some("reject")).unwrap(), VoteChoice::Reject);
        assert_eq!(field_of(vote_choice(None).unwrap_err()), "vote");
        assert_eq!(field_of(vote_choice(Some("maybe")).unwrap_err()), "vote");
    }

    #[test]
    fn typed_signature_uses_name_as_data() {
        let mut typed = request(SignatureMethod::Typed);
        typed.typed_name = Some("Grace Hopper".to_string());
        let checked = signature(typed).unwrap();
        assert_eq!(checked.signature_data, "Grace Hopper");
        assert_eq!(checked.typed_name.as_deref(), Some("Grace Hopper"));
    }

    #[test]
    fn typed_signature_needs_a_name() {
        assert_eq!(
            field_of(signature(request(SignatureMethod::Typed)).unwrap_err()),
            "typed_name"
        );
    }

    #[test]
    fn drawn_signature_needs_data() {
        assert_eq!(
            field_of(signature(request(SignatureMethod::Drawn)).unwrap_err()),
            "signature_data"
        );
    }

    #[test]
    fn ip_address_is_checked() {
        let mut drawn = request(SignatureMethod::Drawn);
        drawn.signature_data = Some("data:image/png;base64,AAAA".to_string());
        drawn.ip_address = Some("10.0.0.300".to_string());
        assert_eq!(field_of(signature(drawn.clone()).unwrap_err()), "ip_address");

        drawn.ip_address = Some("2001:db8::1".to_string());
        assert_eq!(
            signature(drawn).unwrap().ip_address.as_deref(),
            Some("2001:db8::1")
        );
    }
}
