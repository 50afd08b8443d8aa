//! Custom assertion macros and utilities
//!
//! Provides enhanced assertion macros for better test output and
//! more descriptive error messages.

/// Assert that a result is ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($result:expr, $message:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("{}: {:?}", $message, e),
        }
    };
}

/// Assert that a list of server events contains one with the given name
#[macro_export]
macro_rules! assert_has_event {
    ($events:expr, $name:expr) => {
        assert!(
            $events.iter().any(|event| event.name() == $name),
            "Expected a '{}' event, got: {:?}",
            $name,
            $events.iter().map(|event| event.name()).collect::<Vec<_>>()
        );
    };
}

/// Assert that a list of server events has no event with the given name
#[macro_export]
macro_rules! assert_no_event {
    ($events:expr, $name:expr) => {
        assert!(
            !$events.iter().any(|event| event.name() == $name),
            "Did not expect a '{}' event",
            $name
        );
    };
}
