//! Greetings for `/welcome`, `/seeOff` and the `hello` binary.

/// Greet `name`, formally or not.
#[must_use]
pub fn welcome(name: &str, formally: bool) -> String {
    if formally {
        format!("Good day to you, {name}")
    } else {
        format!("Hello {name}")
    }
}

/// Say goodbye to `name`.
#[must_use]
pub fn see_off(name: &str) -> String {
    format!("Goodbye {name}")
}

/// Friendly greeting used by the console demo.
#[must_use]
pub fn greet_friendly(name: &str) -> String {
    format!("Hello {name}")
}

/// Whether a query flag is set: `true`, `1`, `yes` or `on`, any case.
#[must_use]
pub fn is_truthy(value: Option<&str>) -> bool {
    value.is_some_and(|v| {
        let v = v.trim();
        ["true", "1", "yes", "on"]
            .iter()
            .any(|truthy| v.eq_ignore_ascii_case(truthy))
    })
}

/// Greet two people with the same function, first then second.
pub fn greet_two_people<F>(mut greet: F, first: &str, second: &str)
where
    F: FnMut(&str),
{
    greet(first);
    greet(second);
}
