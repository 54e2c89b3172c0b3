use anyhow::Result;
use board_core::schema::{Resolution, ResolutionStatus, Signature, Vote, VoteSummary};
use board_core::{Caller, ResolutionStore, ledger, lifecycle, signatures};
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::macros::format_description;

pub struct VaultPaths {
    pub root: PathBuf,
    pub index_dir: PathBuf,
    pub resolutions_dir: PathBuf,
}

impl VaultPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            index_dir: root.join("00_Index"),
            resolutions_dir: root.join("Resolutions"),
            root,
        }
    }

    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.index_dir)?;
        fs::create_dir_all(&self.resolutions_dir)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VaultReport {
    pub resolutions: usize,
    pub votes: usize,
    pub signatures: usize,
}

/// Write one note per resolution in the caller's organization plus an index.
pub fn build_vault<S: ResolutionStore>(
    store: &S,
    caller: &Caller,
    vault_root: &Path,
) -> Result<VaultReport> {
    let paths = VaultPaths::new(vault_root);
    paths.ensure()?;

    let mut report = VaultReport::default();
    let mut entries: Vec<(ResolutionStatus, String)> = Vec::new();

    // 1) Write resolution notes
    for resolution in lifecycle::list(store, caller, None, None)? {
        let listing = ledger::list(store, caller, &resolution.id)?;
        let signed = signatures::list(store, caller, &resolution.id)?;
        write_resolution_note(&paths, &resolution, &listing.votes, &listing.summary, &signed)?;

        report.resolutions += 1;
        report.votes += listing.votes.len();
        report.signatures += signed.len();
        entries.push((
            resolution.status,
            format!(
                "- [[Resolutions/{}|{}]] ({})",
                resolution.id,
                resolution.title,
                resolution.voting_type
            ),
        ));
    }

    // 2) Write MOC grouped by lifecycle state
    let generated = OffsetDateTime::now_utc().format(format_description!("[year]-[month]-[day]"))?;
    let mut index_lines: Vec<String> = Vec::new();
    index_lines.push("# MOC - Resolutions".to_string());
    index_lines.push(String::new());
    index_lines.push(format!(
        "This index is generated ({generated}). Do not edit manually."
    ));

    for status in [
        ResolutionStatus::Open,
        ResolutionStatus::Draft,
        ResolutionStatus::Passed,
        ResolutionStatus::Failed,
    ] {
        index_lines.push(String::new());
        index_lines.push(format!("## {}", heading(status)));
        index_lines.push(String::new());
        let links: Vec<&String> = entries
            .iter()
            .filter(|(entry_status, _)| *entry_status == status)
            .map(|(_, link)| link)
            .collect();
        if links.is_empty() {
            index_lines.push("_None._".to_string());
        } else {
            index_lines.extend(links.into_iter().cloned());
        }
    }

    let moc_path = paths.index_dir.join("MOC - Resolutions.md");
    fs::write(moc_path, index_lines.join("\n"))?;

    Ok(report)
}

fn heading(status: ResolutionStatus) -> &'static str {
    match status {
        ResolutionStatus::Draft => "Drafts",
        ResolutionStatus::Open => "Open for Voting",
        ResolutionStatus::Passed => "Passed",
        ResolutionStatus::Failed => "Failed",
    }
}

fn write_resolution_note(
    paths: &VaultPaths,
    resolution: &Resolution,
    votes: &[Vote],
    summary: &VoteSummary,
    signed: &[Signature],
) -> Result<()> {
    let note_path = paths.resolutions_dir.join(format!("{}.md", resolution.id));

    let mut md = String::new();
    md.push_str("---\n");
    md.push_str(&format!("id: {}\n", resolution.id));
    md.push_str(&format!("organization_id: {}\n", resolution.organization_id));
    md.push_str(&format!("meeting_id: {}\n", resolution.meeting_id));
    md.push_str(&format!("voting_type: {}\n", resolution.voting_type));
    md.push_str(&format!("status: {}\n", resolution.status));
    md.push_str(&format!("created_by: {}\n", resolution.created_by));
    md.push_str(&format!("created_at: {}\n", resolution.created_at));
    if let Some(closed_at) = &resolution.closed_at {
        md.push_str(&format!("closed_at: {closed_at}\n"));
    }
    md.push_str("summary_json: |\n");
    md.push_str(&indent_yaml_block(&serde_json::to_string_pretty(summary)?));
    md.push_str("---\n\n");

    md.push_str(&format!("# {}\n\n", resolution.title));

    md.push_str("## Description\n");
    match &resolution.description {
        Some(text) if !text.trim().is_empty() => {
            md.push_str(text);
            md.push('\n');
        }
        _ => md.push_str("_No description._\n"),
    }
    md.push('\n');

    md.push_str("## Tally\n");
    md.push_str("| Approve | Reject | Abstain | Total | Result |\n");
    md.push_str("|---|---|---|---|---|\n");
    md.push_str(&format!(
        "| {} | {} | {} | {} | {} |\n\n",
        summary.approve,
        summary.reject,
        summary.abstain,
        summary.total,
        summary.result.status()
    ));
    if resolution.status == ResolutionStatus::Open {
        md.push_str("_Voting is still open; the result above is a preview._\n\n");
    }

    md.push_str("## Votes\n");
    if votes.is_empty() {
        md.push_str("_No votes cast._\n");
    } else {
        md.push_str("| Member | Vote | Voted at | Comment |\n");
        md.push_str("|---|---|---|---|\n");
        for vote in votes {
            md.push_str(&format!(
                "| {} | {} | `{}` | {} |\n",
                table_cell(&vote.board_member_id),
                vote.vote,
                vote.voted_at,
                table_cell(vote.comment.as_deref().unwrap_or(""))
            ));
        }
    }
    md.push('\n');

    md.push_str("## Signatures\n");
    if signed.is_empty() {
        md.push_str("_No signatures recorded._\n");
    } else {
        for signature in signed {
            md.push_str(&format!(
                "- `{}` signed ({}{}) at `{}` from `{}` via `{}`\n",
                signature.board_member_id,
                signature.signature_type,
                signature
                    .typed_name
                    .as_deref()
                    .map(|name| format!(" as \"{name}\""))
                    .unwrap_or_default(),
                signature.signed_at,
                signature.ip_address.as_deref().unwrap_or("unknown"),
                signature.user_agent.as_deref().unwrap_or("unknown")
            ));
        }
    }

    fs::write(note_path, md)?;
    Ok(())
}

fn indent_yaml_block(s: &str) -> String {
    let mut out = String::new();
    for line in s.lines() {
        out.push_str("  ");
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\r', '\n'], " ")
}
