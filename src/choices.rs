use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

/// Returned when a string does not name any variant of a choice set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct UnknownChoice {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a closed choice set.
///
/// Each variant carries its wire/database tag (snake_case) and a human display
/// label. The Postgres side is a native enum type named by `$pg`.
macro_rules! choices {
    (
        $(#[$meta:meta])*
        $name:ident as $pg:literal, default $default:ident {
            $($variant:ident => $tag:literal, $label:literal;)+
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            Serialize, Deserialize, TS, ToSchema, sqlx::Type,
        )]
        #[serde(rename_all = "snake_case")]
        #[sqlx(type_name = $pg, rename_all = "snake_case")]
        #[ts(export)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $tag,)+
                }
            }

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl FromStr for $name {
            type Err = UnknownChoice;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($tag => Ok($name::$variant),)+
                    _ => Err(UnknownChoice {
                        kind: stringify!($name),
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

choices! {
    /// Actor role. Only `Admin` bypasses district scoping.
    Role as "user_role", default Coordinator {
        Admin => "admin", "Community Manager";
        Coordinator => "coordinator", "District Coordinator";
        Readonly => "readonly", "Read Only";
    }
}

choices! {
    InitiativeStatus as "initiative_status", default Active {
        Active => "active", "Active";
        Completed => "completed", "Completed";
        OnHold => "on_hold", "On Hold";
        Cancelled => "cancelled", "Cancelled";
    }
}

choices! {
    InitiativeType as "initiative_type", default Other {
        Training => "training", "Training Program";
        Workshop => "workshop", "Workshop";
        Mentorship => "mentorship", "Mentorship";
        Community => "community", "Community Outreach";
        Research => "research", "Research Project";
        Other => "other", "Other";
    }
}

choices! {
    /// Declaration order is urgency order; the database enum sorts the same way.
    TaskPriority as "task_priority", default Medium {
        Low => "low", "Low";
        Medium => "medium", "Medium";
        High => "high", "High";
        Urgent => "urgent", "Urgent";
    }
}

choices! {
    TaskStatus as "task_status", default NotStarted {
        NotStarted => "not_started", "Not Started";
        InProgress => "in_progress", "In Progress";
        Completed => "completed", "Completed";
        OnHold => "on_hold", "On Hold";
    }
}

choices! {
    NoteType as "note_type", default General {
        Meeting => "meeting", "Meeting Notes";
        Workshop => "workshop", "Workshop Summary";
        General => "general", "General Note";
        Milestone => "milestone", "Milestone Update";
        Feedback => "feedback", "Feedback";
    }
}

/// empty_as_none
///
/// Query-string helper: list filters arrive as `?status=` when the user picks "All",
/// which must mean "no filter" rather than a parse failure.
pub fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_and_labels_line_up() {
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TaskStatus::InProgress.label(), "In Progress");
        assert_eq!(Role::Admin.label(), "Community Manager");
        assert_eq!(InitiativeType::Community.to_string(), "Community Outreach");
    }

    #[test]
    fn parsing_rejects_unknown_tags() {
        assert_eq!("on_hold".parse::<TaskStatus>(), Ok(TaskStatus::OnHold));
        let err = "finished".parse::<TaskStatus>().unwrap_err();
        assert_eq!(err.kind, "TaskStatus");
        assert!("Completed".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn serde_uses_snake_case_tags() {
        let json = serde_json::to_string(&InitiativeStatus::OnHold).unwrap();
        assert_eq!(json, r#""on_hold""#);
        let back: Role = serde_json::from_str(r#""readonly""#).unwrap();
        assert_eq!(back, Role::Readonly);
    }

    #[test]
    fn every_variant_round_trips_through_its_tag() {
        for status in TaskStatus::ALL {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), *status);
        }
        for priority in TaskPriority::ALL {
            assert_eq!(priority.as_str().parse::<TaskPriority>().unwrap(), *priority);
        }
    }

    #[test]
    fn priority_orders_by_urgency() {
        assert!(TaskPriority::Urgent > TaskPriority::High);
        assert!(TaskPriority::Low < TaskPriority::Medium);
    }
}
