//! Per-host decisions about invalid TLS certificates.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use tracing::{info, warn};

/// Decides whether an invalid certificate presented by `host` is accepted.
pub trait CertificatePolicy: Send + Sync {
    fn allow_invalid_certificate(&self, host: &str) -> bool;
}

impl<F> CertificatePolicy for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn allow_invalid_certificate(&self, host: &str) -> bool {
        self(host)
    }
}

/// Rejects every invalid certificate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectInvalid;

impl CertificatePolicy for RejectInvalid {
    fn allow_invalid_certificate(&self, _host: &str) -> bool {
        false
    }
}

/// Accepts invalid certificates from a fixed list of hosts.
#[derive(Debug, Clone, Default)]
pub struct AllowHosts(Vec<String>);

impl AllowHosts {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AllowHosts(hosts.into_iter().map(Into::into).collect())
    }
}

impl CertificatePolicy for AllowHosts {
    fn allow_invalid_certificate(&self, host: &str) -> bool {
        self.0.iter().any(|h| h.eq_ignore_ascii_case(host))
    }
}

/// Remembers the first decision taken for each host.
///
/// The policy is consulted under the lock, so concurrent requests to a new
/// host ask it only once.
pub struct CertificateTrust {
    decisions: Mutex<HashMap<String, bool>>,
    policy: Box<dyn CertificatePolicy>,
}

impl CertificateTrust {
    pub fn new(policy: impl CertificatePolicy + 'static) -> Self {
        CertificateTrust {
            decisions: Mutex::new(HashMap::new()),
            policy: Box::new(policy),
        }
    }

    pub fn reject_all() -> Self {
        Self::new(RejectInvalid)
    }

    /// Whether an invalid certificate from `host` is accepted.
    pub fn allows(&self, host: &str) -> bool {
        let key = host.to_ascii_lowercase();
        let mut decisions = self
            .decisions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *decisions.entry(key).or_insert_with(|| {
            let allow = self.policy.allow_invalid_certificate(host);
            if allow {
                info!(host = %host, "Accepting invalid certificate");
            } else {
                warn!(host = %host, "Rejecting invalid certificate");
            }
            allow
        })
    }

    /// Decision already taken for `host`, if any.
    pub fn decision(&self, host: &str) -> Option<bool> {
        self.decisions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&host.to_ascii_lowercase())
            .copied()
    }
}

impl Default for CertificateTrust {
    fn default() -> Self {
        Self::reject_all()
    }
}

impl fmt::Debug for CertificateTrust {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateTrust")
            .field("decisions", &self.decisions)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn policy_is_asked_once_per_host() {
        let asked = Arc::new(AtomicUsize::new(0));
        let counter = asked.clone();
        let trust = Arc::new(CertificateTrust::new(move |host: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            host == "mail.example.com"
        }));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let trust = trust.clone();
                thread::spawn(move || trust.allows("mail.example.com"))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(asked.load(Ordering::SeqCst), 1);

        assert!(!trust.allows("other.example.com"));
        assert_eq!(trust.decision("MAIL.example.com"), Some(true));
        assert_eq!(trust.decision("unknown.example.com"), None);
        assert_eq!(asked.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn allow_list_ignores_case() {
        let trust = CertificateTrust::new(AllowHosts::new(["Mail.Example.com"]));
        assert!(trust.allows("mail.example.com"));
        assert!(!CertificateTrust::default().allows("mail.example.com"));
    }
}
