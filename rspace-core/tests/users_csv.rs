use rspace_core::contract::UserRole;
use rspace_core::users::{read_user_rows, UserError, UserRow};

const USERS: &str = "\
first,last,email,role,username,password,affiliation,apiKey
Ada,Lovelace,ada@example.org,pi,ada,engine123,Analytical,abcdefghijklmnop
Alan,Turing,alan@example.org,user,alan,enigma456,Bletchley,
Grace,Hopper,grace@example.org,ROLE_PI,grace,cobol789
";

#[test]
fn header_row_is_skipped_and_short_rows_are_padded() {
    let rows = read_user_rows(USERS.as_bytes()).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].username, "ada");
    assert_eq!(rows[2].affiliation, "");
    assert_eq!(rows[2].api_key, "");
}

#[test]
fn rows_become_user_requests() {
    let rows = read_user_rows(USERS.as_bytes()).unwrap();
    let posts: Vec<_> = rows.into_iter().map(|r| r.into_post().unwrap()).collect();

    assert_eq!(posts[0].role, UserRole::Pi);
    assert_eq!(posts[0].api_key.as_deref(), Some("abcdefghijklmnop"));
    assert_eq!(posts[1].role, UserRole::User);
    assert_eq!(posts[1].api_key, None);
    assert_eq!(posts[2].role, UserRole::Pi);

    let json = serde_json::to_value(&posts[1]).unwrap();
    assert_eq!(json["firstName"], "Alan");
    assert_eq!(json["role"], "ROLE_USER");
    assert!(json.get("apiKey").is_none());
}

#[test]
fn required_fields_are_checked() {
    let base = UserRow {
        username: "bob".into(),
        email: "bob@example.org".into(),
        password: "secret".into(),
        ..Default::default()
    };

    let no_user = UserRow { username: String::new(), ..base.clone() };
    assert_eq!(no_user.into_post().unwrap_err(), UserError::Missing("username"));

    let bad_email = UserRow { email: "bob.example.org".into(), ..base.clone() };
    assert_eq!(
        bad_email.into_post().unwrap_err(),
        UserError::InvalidEmail("bob.example.org".into())
    );

    let no_password = UserRow { password: String::new(), ..base.clone() };
    assert_eq!(no_password.into_post().unwrap_err(), UserError::Missing("password"));

    assert!(base.into_post().is_ok());
}

#[test]
fn header_only_file_has_no_rows() {
    let rows = read_user_rows("first,last,email,role,username,password,affiliation,apiKey\n".as_bytes()).unwrap();
    assert!(rows.is_empty());
}
