use std::fmt::Write;

use roster_core::domain::user::{User, UserId};

const SEPARATOR: &str = "----------------------------------------";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn render_user_list(users: &[User]) -> String {
    if users.is_empty() {
        return "No users found in the database.".to_string();
    }

    let mut out = String::from("All Users:\n");
    out.push_str(SEPARATOR);
    out.push('\n');
    for user in users {
        out.push_str(&render_user_block(user));
        out.push_str(SEPARATOR);
        out.push('\n');
    }
    out.truncate(out.trim_end().len());
    out
}

/// Confirms a create with the identifying and contact fields only.
pub fn render_created(user: &User) -> String {
    let mut out = String::from("User created successfully:\n");
    let _ = writeln!(out, "ID: {}", user.id);
    let _ = writeln!(out, "Name: {}", user.name);
    let _ = write!(out, "Email: {}", user.email);
    if let Some(age) = user.age {
        let _ = write!(out, "\nAge: {age}");
    }
    if let Some(phone) = &user.phone_number {
        let _ = write!(out, "\nPhone: {phone}");
    }
    if let Some(role) = &user.role {
        let _ = write!(out, "\nRole: {role}");
    }
    out
}

pub fn render_found(user: &User) -> String {
    format!("Found user:\n{}", render_user_block(user).trim_end())
}

pub fn render_updated(id: UserId) -> String {
    format!("User {id} updated successfully")
}

pub fn render_deleted(id: UserId) -> String {
    format!("User {id} deleted successfully")
}

/// One `Label: value` line per field; optional fields only when present.
fn render_user_block(user: &User) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "ID: {}", user.id);
    let _ = writeln!(out, "Name: {}", user.name);
    let _ = writeln!(out, "Email: {}", user.email);
    if let Some(age) = user.age {
        let _ = writeln!(out, "Age: {age}");
    }
    if let Some(phone) = &user.phone_number {
        let _ = writeln!(out, "Phone: {phone}");
    }
    if let Some(address) = &user.address {
        let _ = writeln!(out, "Address: {address}");
    }
    if let Some(role) = &user.role {
        let _ = writeln!(out, "Role: {role}");
    }
    let _ = writeln!(out, "Active: {}", user.is_active);
    let _ = writeln!(out, "Created: {}", user.created_at.format(TIMESTAMP_FORMAT));
    out
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use roster_core::domain::user::{User, UserId};

    use super::{render_created, render_deleted, render_found, render_updated, render_user_list};

    fn user(id: i64, name: &str, email: &str) -> User {
        let created_at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).single().expect("timestamp");
        User {
            id: UserId(id),
            name: name.to_string(),
            email: email.to_string(),
            age: None,
            phone_number: None,
            address: None,
            role: None,
            is_active: true,
            last_login: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn empty_list_has_fixed_message() {
        assert_eq!(render_user_list(&[]), "No users found in the database.");
    }

    #[test]
    fn list_separates_blocks_with_rules() {
        let rendered =
            render_user_list(&[user(1, "Jane Doe", "jane@x.com"), user(2, "Bob", "bob@y.com")]);

        assert!(rendered.starts_with("All Users:\n----"));
        assert!(rendered.ends_with("----"));
        assert_eq!(rendered.matches("----------------------------------------").count(), 3);
        let jane = rendered.find("Name: Jane Doe").expect("jane");
        let bob = rendered.find("Name: Bob").expect("bob");
        assert!(jane < bob);
    }

    #[test]
    fn optional_fields_appear_only_when_present() {
        let mut jane = user(1, "Jane Doe", "jane@x.com");
        let bare = render_found(&jane);
        assert!(!bare.contains("Age:"));
        assert!(!bare.contains("Role:"));

        jane.age = Some(30);
        jane.role = Some("admin".to_string());
        let full = render_found(&jane);
        assert!(full.contains("Age: 30"));
        assert!(full.contains("Role: admin"));
        assert!(!full.contains("Phone:"));
    }

    #[test]
    fn found_block_formats_timestamp() {
        let rendered = render_found(&user(7, "Jane Doe", "jane@x.com"));

        assert_eq!(
            rendered,
            "Found user:\nID: 7\nName: Jane Doe\nEmail: jane@x.com\n\
             Active: true\nCreated: 2026-03-14 09:26:53"
        );
    }

    #[test]
    fn created_confirmation_omits_address_and_status() {
        let mut jane = user(7, "Jane Doe", "jane@x.com");
        assert_eq!(
            render_created(&jane),
            "User created successfully:\nID: 7\nName: Jane Doe\nEmail: jane@x.com"
        );

        jane.age = Some(30);
        jane.phone_number = Some("555-0100".to_string());
        jane.address = Some("1 Main St".to_string());
        jane.role = Some("admin".to_string());
        assert_eq!(
            render_created(&jane),
            "User created successfully:\nID: 7\nName: Jane Doe\nEmail: jane@x.com\n\
             Age: 30\nPhone: 555-0100\nRole: admin"
        );
    }

    #[test]
    fn update_and_delete_confirmations_name_the_id() {
        assert_eq!(render_updated(UserId(5)), "User 5 updated successfully");
        assert_eq!(render_deleted(UserId(2)), "User 2 deleted successfully");
    }
}
