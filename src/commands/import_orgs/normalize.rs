use super::*;

pub(super) const COLUMN_COUNT: usize = 16;

const COL_ASSIGNEE: usize = 0;
const COL_BLOCKCHAIN: usize = 1;
const COL_DATE: usize = 2;
const COL_DESCRIPTION: usize = 3;
const COL_IMPACT_AREA: usize = 4;
const COL_LOGO: usize = 5;
const COL_NAME: usize = 6;
const COL_PRE_JAN20TH_UPVOTES: usize = 7;
const COL_UPVOTES: usize = 8;
const COL_REVIEWED: usize = 9;
const COL_SUBMITTED_BY_EMAIL: usize = 10;
const COL_SUBMITTED_BY_NAME: usize = 11;
const COL_SUBMITTED_BY_OWNER: usize = 12;
const COL_SUBSCRIBED: usize = 13;
const COL_TOPIC: usize = 14;
const COL_WEB3: usize = 15;

const DATE_FORMAT: &str = "%m/%d/%Y %I:%M %p";

pub(super) struct RowNormalizer {
    emoji: EmojiStripper,
}

impl RowNormalizer {
    pub(super) fn new() -> Result<Self> {
        Ok(Self {
            emoji: EmojiStripper::new()?,
        })
    }

    /// Builds one organization from a row in export column order. Missing
    /// trailing cells read as empty.
    pub(super) fn normalize<S: AsRef<str>>(&self, row: &[S]) -> Result<Organization, NormalizeError> {
        let cells: Vec<String> = (0..COLUMN_COUNT)
            .map(|idx| {
                row.get(idx)
                    .map(|cell| self.emoji.strip(cell.as_ref()))
                    .unwrap_or_default()
            })
            .collect();

        let impactarea = resolve_family(&cells[COL_IMPACT_AREA])?;
        let blockchainecosystem = resolve_family(&cells[COL_BLOCKCHAIN])?;
        let web3 = resolve_family(&cells[COL_WEB3])?;
        let topic = resolve_family(&cells[COL_TOPIC])?;

        Ok(Organization {
            assignee: non_empty(&cells[COL_ASSIGNEE]),
            blockchainecosystem,
            datecreated: parse_datecreated(&cells[COL_DATE])?,
            description: non_empty(&cells[COL_DESCRIPTION]),
            impactarea,
            logo: non_empty(&cells[COL_LOGO]),
            name: cells[COL_NAME].clone(),
            pre_jan20th_upvotes: parse_count(&cells[COL_PRE_JAN20TH_UPVOTES]),
            reviewed: non_empty(&cells[COL_REVIEWED]),
            submittedbyemail: non_empty(&cells[COL_SUBMITTED_BY_EMAIL]),
            submittedbyname: non_empty(&cells[COL_SUBMITTED_BY_NAME]),
            submittedbyowner: non_empty(&cells[COL_SUBMITTED_BY_OWNER]),
            subscribed: non_empty(&cells[COL_SUBSCRIBED]),
            topic,
            upvotes: parse_count(&cells[COL_UPVOTES]),
            web3,
        })
    }
}

pub(super) fn is_blank_row<S: AsRef<str>>(row: &[S]) -> bool {
    row.iter().all(|cell| cell.as_ref().trim().is_empty())
}

fn resolve_family<T: Resolvable>(cell: &str) -> Result<Option<BTreeSet<T>>, NormalizeError> {
    let members = resolve_cell::<T>(cell)?;
    Ok(if members.is_empty() { None } else { Some(members) })
}

/// Export timestamps carry no zone and are taken as UTC.
pub(super) fn parse_datecreated(cell: &str) -> Result<Option<DateTime<Utc>>, NormalizeError> {
    if cell.is_empty() {
        return Ok(None);
    }

    let parsed = NaiveDateTime::parse_from_str(cell, DATE_FORMAT).map_err(|source| {
        NormalizeError::InvalidDate {
            value: cell.to_string(),
            source,
        }
    })?;

    Ok(Some(parsed.and_utc()))
}

/// Digit-only cells become counts; anything else, and zero, is absent.
pub(super) fn parse_count(cell: &str) -> Option<u64> {
    if cell.is_empty() || !cell.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }

    match cell.parse::<u64>() {
        Ok(0) | Err(_) => None,
        Ok(value) => Some(value),
    }
}
