use crate::source::VersionRecord;

/// Errors that can occur while picking the version to verify against.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("no versions available for this service")]
    Empty,

    #[error("invalid version number {number:?}: {reason}")]
    Unparsable { number: String, reason: String },
}

/// A remote version with its number parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteVersion {
    pub number: u64,
    pub record: VersionRecord,
}

/// The outcome of version resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    /// Highest version number present in the listing.
    pub latest: u64,
    /// The version files are compared against: the override if one was
    /// given, otherwise `latest`.
    pub selected: String,
}

/// Parse every record in an unordered listing. Fails on the first number
/// that is not a non-negative integer.
pub fn parse_versions(records: &[VersionRecord]) -> Result<Vec<RemoteVersion>, VersionError> {
    records
        .iter()
        .map(|record| {
            let number = record.number.trim().parse::<u64>().map_err(|e| {
                VersionError::Unparsable {
                    number: record.number.clone(),
                    reason: e.to_string(),
                }
            })?;
            Ok(RemoteVersion {
                number,
                record: record.clone(),
            })
        })
        .collect()
}

/// Pick the version to compare against.
///
/// The listing is not assumed to be sorted. An override is taken verbatim
/// and is not checked against the listing, but the listing itself must
/// still be non-empty and fully parsable.
pub fn resolve(
    records: &[VersionRecord],
    override_version: Option<&str>,
) -> Result<ResolvedVersion, VersionError> {
    let versions = parse_versions(records)?;

    let latest = versions
        .iter()
        .map(|v| v.number)
        .max()
        .ok_or(VersionError::Empty)?;

    let selected = match override_version {
        Some(v) if !v.is_empty() => v.to_owned(),
        _ => latest.to_string(),
    };

    tracing::info!(latest, selected = %selected, "resolved service version");

    Ok(ResolvedVersion { latest, selected })
}
