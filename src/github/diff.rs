/// Shape of a unified diff, used to describe what was fetched before it is
/// handed to the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub files: usize,
    pub additions: usize,
    pub deletions: usize,
}

/// Count files and changed lines in the raw text from GitHub's diff endpoint.
///
/// Each file section starts with `diff --git a/{path} b/{path}`. Inside a
/// section, `+`/`-` lines count as additions/deletions, except the `+++`/`---`
/// file headers that precede the first hunk.
pub fn summarize(raw_diff: &str) -> DiffSummary {
    let mut summary = DiffSummary::default();
    let mut in_hunk = false;

    for line in raw_diff.lines() {
        if line.starts_with("diff --git ") {
            summary.files += 1;
            in_hunk = false;
            continue;
        }
        if line.starts_with("@@") {
            in_hunk = true;
            continue;
        }
        if !in_hunk {
            continue;
        }
        if line.starts_with('+') {
            summary.additions += 1;
        } else if line.starts_with('-') {
            summary.deletions += 1;
        }
    }

    summary
}
