use plugwatch::error::PlugwatchError;

#[test]
fn error_constructors_group_1() {
    assert!(matches!(
        PlugwatchError::config("x"),
        PlugwatchError::Config { .. }
    ));
    assert!(matches!(PlugwatchError::io("x"), PlugwatchError::Io { .. }));
    assert!(matches!(
        PlugwatchError::serialization("x"),
        PlugwatchError::Serialization { .. }
    ));
    assert!(matches!(
        PlugwatchError::network("x"),
        PlugwatchError::Network { .. }
    ));
    assert!(matches!(PlugwatchError::api("x"), PlugwatchError::Api { .. }));
}

#[test]
fn error_constructors_group_2() {
    assert!(matches!(
        PlugwatchError::auth("x"),
        PlugwatchError::Auth { .. }
    ));
    assert!(matches!(
        PlugwatchError::validation("f", "m"),
        PlugwatchError::Validation { .. }
    ));
    assert!(matches!(
        PlugwatchError::timeout("x"),
        PlugwatchError::Timeout { .. }
    ));
    assert!(matches!(
        PlugwatchError::notification("x"),
        PlugwatchError::Notification { .. }
    ));
    assert!(matches!(
        PlugwatchError::generic("x"),
        PlugwatchError::Generic { .. }
    ));
}

#[test]
fn display_messages() {
    let e = PlugwatchError::validation("geofence.radius_meters", "bad");
    let s = format!("{}", e);
    assert!(s.contains("Validation error"));
    assert!(s.contains("geofence.radius_meters"));

    let e = PlugwatchError::notification("smtp down");
    assert_eq!(e.to_string(), "Notification error: smtp down");
}

#[test]
fn io_and_json_errors_convert() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    assert!(matches!(PlugwatchError::from(io), PlugwatchError::Io { .. }));

    let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(matches!(
        PlugwatchError::from(json),
        PlugwatchError::Serialization { .. }
    ));
}
