//! Sort specification and type-dispatched case comparator.

use crate::model::case::CaseRecord;
use std::cmp::Ordering;

/// Semantic type a sort field compares by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKind {
    /// Epoch milliseconds, missing treated as 0.
    Date,
    /// Case-insensitive text.
    Text,
    /// `false` before `true` ascending.
    Flag,
    /// Compares equal; order is left unchanged.
    Unsupported,
}

/// Case field a list can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    DeletedAt,
    CaseDate,
    CaseNumber,
    ClientName,
    CurrentSummary,
    Status,
    UserId,
    IsDeleted,
    IsPrimary,
    CanWrite,
    CanExport,
    Client,
}

impl SortField {
    pub fn kind(self) -> SortKind {
        match self {
            Self::CreatedAt | Self::UpdatedAt | Self::DeletedAt | Self::CaseDate => SortKind::Date,
            Self::CaseNumber
            | Self::ClientName
            | Self::CurrentSummary
            | Self::Status
            | Self::UserId => SortKind::Text,
            Self::IsDeleted | Self::IsPrimary | Self::CanWrite | Self::CanExport => SortKind::Flag,
            Self::Client => SortKind::Unsupported,
        }
    }

    /// Record field name (camelCase).
    pub fn as_key(self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
            Self::UpdatedAt => "updatedAt",
            Self::DeletedAt => "deletedAt",
            Self::CaseDate => "caseDate",
            Self::CaseNumber => "caseNumber",
            Self::ClientName => "clientName",
            Self::CurrentSummary => "currentSummary",
            Self::Status => "status",
            Self::UserId => "userId",
            Self::IsDeleted => "isDeleted",
            Self::IsPrimary => "isPrimary",
            Self::CanWrite => "canWrite",
            Self::CanExport => "canExport",
            Self::Client => "client",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        [
            Self::CreatedAt,
            Self::UpdatedAt,
            Self::DeletedAt,
            Self::CaseDate,
            Self::CaseNumber,
            Self::ClientName,
            Self::CurrentSummary,
            Self::Status,
            Self::UserId,
            Self::IsDeleted,
            Self::IsPrimary,
            Self::CanWrite,
            Self::CanExport,
            Self::Client,
        ]
        .into_iter()
        .find(|field| field.as_key() == key)
    }

    fn date(self, case: &CaseRecord) -> i64 {
        match self {
            Self::CreatedAt => case.created_at,
            Self::UpdatedAt => case.updated_at,
            Self::DeletedAt => case.deleted_at.unwrap_or(0),
            Self::CaseDate => case.case_date.unwrap_or(0),
            _ => 0,
        }
    }

    fn text(self, case: &CaseRecord) -> &str {
        match self {
            Self::CaseNumber => &case.case_number,
            Self::ClientName => &case.client_name,
            Self::CurrentSummary => &case.current_summary,
            Self::Status => case.status.as_str(),
            Self::UserId => &case.user_id,
            _ => "",
        }
    }

    fn flag(self, case: &CaseRecord) -> bool {
        match self {
            Self::IsDeleted => case.is_deleted,
            Self::IsPrimary => case.is_primary,
            Self::CanWrite => case.can_write,
            Self::CanExport => case.can_export,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Field plus direction. Defaults to most recently updated first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: SortField::UpdatedAt,
            direction: SortDirection::Desc,
        }
    }
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Header-click toggle: same field ascending flips to descending,
    /// anything else starts ascending.
    pub fn toggled(self, field: SortField) -> Self {
        let direction = if self.field == field && self.direction == SortDirection::Asc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        Self { field, direction }
    }
}

/// Compares two cases under `spec`.
pub fn compare_cases(a: &CaseRecord, b: &CaseRecord, spec: SortSpec) -> Ordering {
    let field = spec.field;
    let ascending = match field.kind() {
        SortKind::Date => field.date(a).cmp(&field.date(b)),
        SortKind::Text => compare_text(field.text(a), field.text(b)),
        SortKind::Flag => field.flag(a).cmp(&field.flag(b)),
        SortKind::Unsupported => Ordering::Equal,
    };

    match spec.direction {
        SortDirection::Asc => ascending,
        SortDirection::Desc => ascending.reverse(),
    }
}

/// Stable in-place sort of a projection.
pub fn sort_cases(cases: &mut [&CaseRecord], spec: SortSpec) {
    cases.sort_by(|a, b| compare_cases(a, b, spec));
}

// Lowercase comparison stands in for locale collation; ties fall back to the
// raw text so the order stays total.
fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::{compare_text, SortDirection, SortField, SortKind, SortSpec};
    use std::cmp::Ordering;

    #[test]
    fn field_keys_parse_back() {
        for key in ["updatedAt", "clientName", "canExport", "client"] {
            assert_eq!(SortField::parse(key).map(SortField::as_key), Some(key));
        }
        assert_eq!(SortField::parse("workflow"), None);
        assert_eq!(SortField::Client.kind(), SortKind::Unsupported);
    }

    #[test]
    fn text_compares_case_insensitively() {
        assert_eq!(compare_text("alpha", "Beta"), Ordering::Less);
        assert_eq!(compare_text("Zed", "apple"), Ordering::Greater);
    }

    #[test]
    fn toggle_flips_only_same_ascending_field() {
        let spec = SortSpec::default();
        let by_name = spec.toggled(SortField::ClientName);
        assert_eq!(by_name.direction, SortDirection::Asc);
        assert_eq!(by_name.toggled(SortField::ClientName).direction, SortDirection::Desc);
        assert_eq!(
            SortSpec::new(SortField::ClientName, SortDirection::Desc)
                .toggled(SortField::ClientName)
                .direction,
            SortDirection::Asc
        );
    }
}
