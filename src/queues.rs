//! # Queue Namespaces
//!
//! The ingestion core watches two parallel namespaces of queue names: the
//! production set and a dev set derived by the uniform `"eggi-" ->
//! `"eggi-dev-"` substitution. The environment is modeled as an explicit
//! two-element enum over precomputed name lists so the hot path never
//! rewrites strings (and double-substitution cannot occur).

/// Prefix shared by every production queue name.
pub const PROD_PREFIX: &str = "eggi-";

/// Prefix marking a dev-environment queue name.
pub const DEV_PREFIX: &str = "eggi-dev-";

/// Main pipeline queues, production names.
pub const MAIN_QUEUES: [&str; 3] = [
    "eggi-mapping-service-profiles-to-analyse",
    "eggi-profiles-to-analyse-preparation",
    "eggi-profile-analysis-completed-supabase-sync",
];

/// Dead-letter queues, production names.
pub const DLQ_QUEUES: [&str; 3] = [
    "eggi-mapping-service-profiles-dlq",
    "eggi-profile-analysis-preparation-dlq",
    "eggi-profile-analysis-completed-supabase-sync-dlq",
];

/// Default event-stream queue consumed by the stream poller.
pub const DEFAULT_EVENT_QUEUE: &str = "eggi-profile-analysis-events";

/// Map a production queue name to its dev-environment counterpart.
///
/// Idempotent: a name already carrying the dev marker is returned as-is,
/// so applying the substitution twice is a no-op beyond the first.
pub fn dev_queue_name(name: &str) -> String {
    if name.starts_with(DEV_PREFIX) {
        return name.to_string();
    }
    match name.strip_prefix(PROD_PREFIX) {
        Some(rest) => format!("{DEV_PREFIX}{rest}"),
        None => name.to_string(),
    }
}

/// Map a dev queue name back to its production counterpart.
pub fn prod_queue_name(name: &str) -> String {
    match name.strip_prefix(DEV_PREFIX) {
        Some(rest) => format!("{PROD_PREFIX}{rest}"),
        None => name.to_string(),
    }
}

/// Active queue namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueEnv {
    Prod,
    Dev,
}

impl QueueEnv {
    pub fn from_dev_flag(use_dev_queues: bool) -> Self {
        if use_dev_queues {
            Self::Dev
        } else {
            Self::Prod
        }
    }

    /// Main queue names for this environment.
    pub fn main_queues(self) -> Vec<String> {
        self.template(&MAIN_QUEUES)
    }

    /// Dead-letter queue names for this environment.
    pub fn dlq_queues(self) -> Vec<String> {
        self.template(&DLQ_QUEUES)
    }

    /// Every queue name sampled by the depth poller in this environment.
    pub fn all_queues(self) -> Vec<String> {
        let mut names = self.main_queues();
        names.extend(self.dlq_queues());
        names
    }

    /// Event-stream queue name for this environment.
    pub fn event_queue(self, prod_name: &str) -> String {
        match self {
            Self::Prod => prod_queue_name(prod_name),
            Self::Dev => dev_queue_name(prod_name),
        }
    }

    /// The same queue's name in the opposite environment. Used by the
    /// published-state fallback when the active environment has no data
    /// yet for a name.
    pub fn counterpart(self, name: &str) -> String {
        match self {
            Self::Prod => dev_queue_name(name),
            Self::Dev => prod_queue_name(name),
        }
    }

    fn template(self, prod_names: &[&str]) -> Vec<String> {
        prod_names
            .iter()
            .map(|name| match self {
                Self::Prod => (*name).to_string(),
                Self::Dev => dev_queue_name(name),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_substitution_is_idempotent() {
        for name in MAIN_QUEUES.iter().chain(DLQ_QUEUES.iter()) {
            let once = dev_queue_name(name);
            let twice = dev_queue_name(&once);
            assert_eq!(once, twice, "double substitution must be a no-op");
            assert!(once.starts_with(DEV_PREFIX));
        }
    }

    #[test]
    fn dev_and_prod_substitutions_round_trip() {
        let dev = dev_queue_name("eggi-profiles-to-analyse-preparation");
        assert_eq!(dev, "eggi-dev-profiles-to-analyse-preparation");
        assert_eq!(
            prod_queue_name(&dev),
            "eggi-profiles-to-analyse-preparation"
        );
    }

    #[test]
    fn unprefixed_names_pass_through() {
        assert_eq!(dev_queue_name("other-queue"), "other-queue");
        assert_eq!(prod_queue_name("other-queue"), "other-queue");
    }

    #[test]
    fn env_templating_applies_uniformly() {
        let prod = QueueEnv::Prod.all_queues();
        let dev = QueueEnv::Dev.all_queues();
        assert_eq!(prod.len(), 6);
        assert_eq!(dev.len(), 6);
        for (p, d) in prod.iter().zip(dev.iter()) {
            assert_eq!(dev_queue_name(p), *d);
            assert_eq!(prod_queue_name(d), *p);
        }
    }

    #[test]
    fn counterpart_crosses_environments() {
        let name = "eggi-mapping-service-profiles-dlq";
        assert_eq!(
            QueueEnv::Prod.counterpart(name),
            "eggi-dev-mapping-service-profiles-dlq"
        );
        assert_eq!(
            QueueEnv::Dev.counterpart("eggi-dev-mapping-service-profiles-dlq"),
            name
        );
    }

    #[test]
    fn event_queue_follows_environment() {
        assert_eq!(
            QueueEnv::Prod.event_queue(DEFAULT_EVENT_QUEUE),
            "eggi-profile-analysis-events"
        );
        assert_eq!(
            QueueEnv::Dev.event_queue(DEFAULT_EVENT_QUEUE),
            "eggi-dev-profile-analysis-events"
        );
    }
}
