//! Keyword classification of backend responses into record operations.

use serde::Serialize;

use roster_core::domain::user::{NewUser, UserId, UserPatch};
use roster_core::errors::DomainError;

use crate::extract::{extract_email, extract_parameters, extract_user_id};

const CREATE_KEYWORDS: &[&str] = &["create", "add", "new", "insert"];
const READ_KEYWORDS: &[&str] = &["get", "find", "show", "display", "search", "list", "fetch"];
const UPDATE_KEYWORDS: &[&str] = &["update", "modify", "change", "edit"];
const DELETE_KEYWORDS: &[&str] = &["delete", "remove", "drop"];
const ALL_KEYWORDS: &[&str] = &["all", "everyone", "everybody", "users", "everything"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Create,
    GetById,
    GetByEmail,
    Update,
    Delete,
    ListAll,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::GetById => "get_by_id",
            Self::GetByEmail => "get_by_email",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::ListAll => "list_all",
        }
    }
}

/// Which keyword groups occur in the normalised text. Matching is by substring,
/// so `address` counts as `add` and `news` counts as `new`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Signals {
    create: bool,
    read: bool,
    update: bool,
    delete: bool,
    everything: bool,
    mentions_email: bool,
}

impl Signals {
    fn detect(normalized: &str) -> Self {
        let any = |keywords: &[&str]| keywords.iter().any(|keyword| normalized.contains(keyword));

        Self {
            create: any(CREATE_KEYWORDS),
            read: any(READ_KEYWORDS),
            update: any(UPDATE_KEYWORDS),
            delete: any(DELETE_KEYWORDS),
            everything: any(ALL_KEYWORDS),
            mentions_email: normalized.contains("email"),
        }
    }
}

type ClassificationRule = fn(&Signals) -> Option<OperationKind>;

fn list_all_rule(signals: &Signals) -> Option<OperationKind> {
    (signals.read && signals.everything).then_some(OperationKind::ListAll)
}

fn create_rule(signals: &Signals) -> Option<OperationKind> {
    signals.create.then_some(OperationKind::Create)
}

fn read_rule(signals: &Signals) -> Option<OperationKind> {
    signals.read.then_some(if signals.mentions_email {
        OperationKind::GetByEmail
    } else {
        OperationKind::GetById
    })
}

fn update_rule(signals: &Signals) -> Option<OperationKind> {
    signals.update.then_some(OperationKind::Update)
}

fn delete_rule(signals: &Signals) -> Option<OperationKind> {
    signals.delete.then_some(OperationKind::Delete)
}

// First match wins; reordering changes which operation ambiguous text maps to.
const CLASSIFICATION_RULES: [ClassificationRule; 5] =
    [list_all_rule, create_rule, read_rule, update_rule, delete_rule];

/// Classify a response. `None` means no operation keyword was found.
pub fn classify(text: &str) -> Option<OperationKind> {
    let normalized = text.trim().to_lowercase();
    let signals = Signals::detect(&normalized);
    CLASSIFICATION_RULES.iter().find_map(|rule| rule(&signals))
}

/// A fully validated operation, ready for the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum OperationRequest {
    Create(NewUser),
    /// An absent key is carried through and reported by the store as not found.
    GetById {
        id: Option<UserId>,
    },
    GetByEmail {
        email: Option<String>,
    },
    Update {
        id: UserId,
        patch: UserPatch,
    },
    Delete {
        id: UserId,
    },
    ListAll,
}

impl OperationRequest {
    /// Classify, extract and validate in one step.
    pub fn parse(text: &str) -> Result<Self, DomainError> {
        let kind = classify(text).ok_or(DomainError::UnrecognizedOperation)?;
        Self::resolve(kind, text)
    }

    pub fn resolve(kind: OperationKind, text: &str) -> Result<Self, DomainError> {
        match kind {
            OperationKind::Create => {
                let params = extract_parameters(text);
                match (params.name, params.email) {
                    (Some(name), Some(email)) => Ok(Self::Create(NewUser {
                        name,
                        email,
                        age: params.age,
                        phone_number: params.phone,
                        address: params.address,
                        role: params.role,
                    })),
                    _ => Err(DomainError::MissingRequiredField {
                        operation: "create",
                        fields: "name, email",
                    }),
                }
            }
            OperationKind::GetById => Ok(Self::GetById { id: extract_user_id(text) }),
            OperationKind::GetByEmail => Ok(Self::GetByEmail { email: extract_email(text) }),
            OperationKind::Update => {
                let id = extract_user_id(text).ok_or(DomainError::MissingRequiredField {
                    operation: "update",
                    fields: "id",
                })?;
                let params = extract_parameters(text);
                Ok(Self::Update { id, patch: UserPatch { name: params.name, email: params.email } })
            }
            OperationKind::Delete => {
                let id = extract_user_id(text).ok_or(DomainError::MissingRequiredField {
                    operation: "delete",
                    fields: "id",
                })?;
                Ok(Self::Delete { id })
            }
            OperationKind::ListAll => Ok(Self::ListAll),
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Create(_) => OperationKind::Create,
            Self::GetById { .. } => OperationKind::GetById,
            Self::GetByEmail { .. } => OperationKind::GetByEmail,
            Self::Update { .. } => OperationKind::Update,
            Self::Delete { .. } => OperationKind::Delete,
            Self::ListAll => OperationKind::ListAll,
        }
    }
}

#[cfg(test)]
mod tests {
    use roster_core::domain::user::{NewUser, UserId, UserPatch};
    use roster_core::errors::DomainError;

    use super::{classify, OperationKind, OperationRequest, Signals};

    #[test]
    fn classifies_each_operation_from_plain_sentences() {
        let cases = [
            ("create user named Jane Doe email jane@x.com age 30", OperationKind::Create),
            ("list all users", OperationKind::ListAll),
            ("show everyone", OperationKind::ListAll),
            ("get user with id=42", OperationKind::GetById),
            ("find the person with email bob@y.com", OperationKind::GetByEmail),
            ("change user id 5 name to Bob", OperationKind::Update),
            ("remove user with ID 2", OperationKind::Delete),
        ];

        for (text, expected) in cases {
            assert_eq!(classify(text), Some(expected), "text: {text}");
        }
    }

    #[test]
    fn classification_is_case_insensitive_and_trims() {
        assert_eq!(classify("   LIST ALL USERS  "), Some(OperationKind::ListAll));
        assert_eq!(classify("Delete User ID 4"), Some(OperationKind::Delete));
    }

    #[test]
    fn unrecognized_text_classifies_to_none() {
        assert_eq!(classify("hello there"), None);
        assert_eq!(classify(""), None);
        assert_eq!(classify("  \t\n "), None);
        assert!(matches!(OperationRequest::parse("hello there"), Err(DomainError::UnrecognizedOperation)));
        assert!(matches!(OperationRequest::parse("  \t\n "), Err(DomainError::UnrecognizedOperation)));
    }

    #[test]
    fn rule_order_resolves_ambiguous_text() {
        // create outranks update and delete
        assert_eq!(classify("create then delete user"), Some(OperationKind::Create));
        // read outranks update
        assert_eq!(classify("find and update user id 3"), Some(OperationKind::GetById));
        // update outranks delete
        assert_eq!(classify("change or remove user id 3"), Some(OperationKind::Update));
        // list all outranks create
        assert_eq!(classify("add then list all"), Some(OperationKind::ListAll));
    }

    #[test]
    fn substring_matches_are_kept() {
        assert_eq!(classify("user at this address"), Some(OperationKind::Create));
        assert_eq!(classify("show users"), Some(OperationKind::ListAll));
    }

    #[test]
    fn signals_record_each_keyword_group() {
        let signals = Signals::detect("fetch everything by email");
        assert!(signals.read);
        assert!(signals.everything);
        assert!(signals.mentions_email);
        assert!(!signals.create);
        assert!(!signals.delete);
    }

    #[test]
    fn create_builds_request_with_optional_fields() {
        let request =
            OperationRequest::parse("create user named Jane Doe email jane@x.com age 30 role admin")
                .expect("parse");

        assert_eq!(
            request,
            OperationRequest::Create(NewUser {
                age: Some(30),
                role: Some("admin".to_string()),
                ..NewUser::new("Jane Doe", "jane@x.com")
            })
        );
        assert_eq!(request.kind(), OperationKind::Create);
    }

    #[test]
    fn create_without_email_is_missing_required_field() {
        let error = OperationRequest::parse("add user named Jane").expect_err("no email");
        assert!(matches!(
            error,
            DomainError::MissingRequiredField { operation: "create", fields: "name, email" }
        ));
    }

    #[test]
    fn update_and_delete_require_an_id() {
        let error = OperationRequest::parse("delete user").expect_err("no id");
        assert!(matches!(error, DomainError::MissingRequiredField { operation: "delete", .. }));

        let error = OperationRequest::parse("update user named Bo").expect_err("no id");
        assert!(matches!(error, DomainError::MissingRequiredField { operation: "update", .. }));

        let error = OperationRequest::parse("delete user id 0").expect_err("zero id");
        assert!(matches!(error, DomainError::MissingRequiredField { operation: "delete", .. }));
    }

    #[test]
    fn update_without_name_or_email_yields_empty_patch() {
        let request = OperationRequest::parse("update user id 5").expect("parse");
        assert_eq!(request, OperationRequest::Update { id: UserId(5), patch: UserPatch::default() });
    }

    #[test]
    fn lookups_carry_absent_keys_through() {
        assert_eq!(OperationRequest::parse("show user"), Ok(OperationRequest::GetById { id: None }));
        assert_eq!(
            OperationRequest::parse("find user by email"),
            Ok(OperationRequest::GetByEmail { email: None })
        );
        assert_eq!(
            OperationRequest::parse("get user with email=bob@y.com"),
            Ok(OperationRequest::GetByEmail { email: Some("bob@y.com".to_string()) })
        );
    }

    #[test]
    fn request_serializes_with_operation_tag() {
        let request = OperationRequest::parse("delete user id 9").expect("parse");
        let value = serde_json::to_value(&request).expect("serialize");
        assert_eq!(value["operation"], "delete");
        assert_eq!(value["id"], 9);
    }
}
