//! Reusable predicates for probe values.

use crate::command::CommandOutput;
use crate::http::EndpointResponse;
use crate::pods::PodPhases;

/// Accept values whose text contains `needle`.
pub fn contains<T: AsRef<str>>(needle: impl Into<String>) -> impl FnMut(&T) -> bool + Send {
    let needle = needle.into();
    move |value: &T| value.as_ref().contains(needle.as_str())
}

/// Accept values with non-blank text.
pub fn non_empty<T: AsRef<str>>() -> impl FnMut(&T) -> bool + Send {
    |value: &T| !value.as_ref().trim().is_empty()
}

/// Accept commands that exited with status 0.
pub fn exited_ok() -> impl FnMut(&CommandOutput) -> bool + Send {
    |output: &CommandOutput| output.success()
}

/// Accept a query result that found something.
pub fn found() -> impl FnMut(&Option<String>) -> bool + Send {
    |value: &Option<String>| value.is_some()
}

/// Accept a query result that found a value containing `needle`.
pub fn found_containing(needle: impl Into<String>) -> impl FnMut(&Option<String>) -> bool + Send {
    let needle = needle.into();
    move |value: &Option<String>| {
        value
            .as_deref()
            .is_some_and(|v| v.contains(needle.as_str()))
    }
}

/// Accept responses with the given HTTP status.
pub fn status_is(status: u16) -> impl FnMut(&EndpointResponse) -> bool + Send {
    move |response: &EndpointResponse| response.status == status
}

/// Accept pod readings where every check matched pods and all are `Running`.
pub fn all_pods_running() -> impl FnMut(&Vec<PodPhases>) -> bool + Send {
    |observed: &Vec<PodPhases>| {
        !observed.is_empty() && observed.iter().all(PodPhases::all_running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("deployment \"fleet-controller\" successfully rolled out", true)]
    #[case("Waiting for deployment rollout to finish", false)]
    #[case("", false)]
    fn test_contains(#[case] text: &str, #[case] expected: bool) {
        let mut rolled_out = contains::<String>("successfully rolled out");
        assert_eq!(rolled_out(&text.to_string()), expected);
    }

    #[rstest]
    #[case("c-m-abc123", true)]
    #[case("  \n", false)]
    #[case("", false)]
    fn test_non_empty(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(non_empty::<String>()(&text.to_string()), expected);
    }

    #[test]
    fn test_found_containing() {
        let mut ready = found_containing("True");
        assert!(ready(&Some("True".to_string())));
        assert!(!ready(&Some("False".to_string())));
        assert!(!ready(&None));

        assert!(found()(&Some(String::new())));
        assert!(!found()(&None));
    }

    #[test]
    fn test_command_and_http_predicates() {
        let output = CommandOutput {
            stdout: "ok".into(),
            stderr: String::new(),
            code: Some(0),
        };
        assert!(exited_ok()(&output));
        assert!(contains::<CommandOutput>("ok")(&output));

        let response = EndpointResponse {
            status: 401,
            body: r#"{"message": "Unauthorized"}"#.into(),
        };
        assert!(status_is(401)(&response));
        assert!(!status_is(200)(&response));
    }

    #[test]
    fn test_all_pods_running() {
        use crate::pods::PodCheck;

        let phases = |ns: &str, phases: &[&str]| PodPhases {
            check: PodCheck::new(ns, "app=rancher"),
            phases: phases.iter().map(|p| p.to_string()).collect(),
        };

        let mut ready = all_pods_running();
        assert!(ready(&vec![
            phases("cattle-system", &["Running"]),
            phases("cattle-fleet-system", &["Running", "Running"]),
        ]));
        assert!(!ready(&vec![
            phases("cattle-system", &["Running"]),
            phases("cattle-fleet-system", &["Pending", "Running"]),
        ]));
        assert!(!ready(&vec![phases("cattle-system", &[])]));
        assert!(!ready(&Vec::new()));
    }
}
