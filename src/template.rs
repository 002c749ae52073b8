use tracing::{debug, warn};

use crate::github::HostingApi;
use crate::pipeline::Outcome;
use crate::session::IgnoreTemplate;

/// Fetch ignore-file text for `template`.
///
/// Never fatal: a failed fetch degrades to empty content so no ignore file is written.
pub fn fetch<H: HostingApi + ?Sized>(host: &H, template: IgnoreTemplate) -> Outcome<String> {
    let Some(name) = template.catalog_name() else {
        debug!("No ignore template selected");
        return Outcome::Done(String::new());
    };
    match host.get_ignore_template(name) {
        Ok(source) => Outcome::Done(source),
        Err(reason) => {
            warn!("Could not fetch the {name} ignore template: {reason}");
            Outcome::Recoverable {
                value: String::new(),
                reason,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FailureKind, StepError};
    use crate::github::{RepoDescriptor, UserProfile};
    use crate::session::{AccessToken, RepoRequest};
    use std::cell::Cell;

    fn fetch_text(host: &CatalogHost, template: IgnoreTemplate) -> String {
        match fetch(host, template) {
            Outcome::Done(text) | Outcome::Recoverable { value: text, .. } => text,
            Outcome::Fatal(e) => panic!("template fetch must never be fatal: {e}"),
        }
    }

    struct CatalogHost {
        fail: bool,
        calls: Cell<u32>,
    }

    impl HostingApi for CatalogHost {
        fn create_repository(
            &self,
            _token: &AccessToken,
            _request: &RepoRequest,
        ) -> Result<RepoDescriptor, StepError> {
            unreachable!("template fetch never creates repositories")
        }

        fn get_user(&self, _token: &AccessToken, _login: &str) -> Result<UserProfile, StepError> {
            unreachable!("template fetch never resolves users")
        }

        fn get_ignore_template(&self, name: &str) -> Result<String, StepError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                Err(StepError::new(FailureKind::NetworkError, "offline"))
            } else {
                Ok(format!("# {name}\n*.log\n"))
            }
        }
    }

    #[test]
    fn test_none_skips_the_catalog() {
        let host = CatalogHost { fail: false, calls: Cell::new(0) };
        assert_eq!(fetch(&host, IgnoreTemplate::None), Outcome::Done(String::new()));
        assert_eq!(host.calls.get(), 0);
    }

    #[test]
    fn test_every_catalog_entry_yields_text() {
        let host = CatalogHost { fail: false, calls: Cell::new(0) };
        for template in IgnoreTemplate::ALL {
            let text = fetch_text(&host, template);
            if template == IgnoreTemplate::None {
                assert!(text.is_empty());
            } else {
                assert!(!text.is_empty(), "{template}");
            }
        }
    }

    #[test]
    fn test_failure_is_recoverable_and_empty() {
        let host = CatalogHost { fail: true, calls: Cell::new(0) };
        match fetch(&host, IgnoreTemplate::Go) {
            Outcome::Recoverable { value, reason } => {
                assert!(value.is_empty());
                assert_eq!(reason.kind, FailureKind::NetworkError);
            }
            other => panic!("expected recoverable outcome, got {other:?}"),
        }
        assert_eq!(fetch_text(&host, IgnoreTemplate::Rails), "");
    }
}
