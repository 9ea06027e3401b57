use super::Outcome;

/// Kind of alert emitted by the notification policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Down,
    Recovered,
}

/// A message the policy wants delivered. Delivery is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub hostname: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl Notification {
    fn down(hostname: &str, recipient: &str, reasons: &[String]) -> Self {
        let mut body = format!(
            "{} failed {} consecutive checks of http://{}/\n\n",
            hostname,
            reasons.len(),
            hostname
        );
        for (n, reason) in reasons.iter().enumerate() {
            body.push_str(&format!("  {}. {}\n", n + 1, reason));
        }

        Self {
            kind: NotificationKind::Down,
            hostname: hostname.to_string(),
            recipient: recipient.to_string(),
            subject: format!("[hostwatch] {} is DOWN", hostname),
            body,
        }
    }

    fn recovered(hostname: &str, recipient: &str, failures: u32) -> Self {
        Self {
            kind: NotificationKind::Recovered,
            hostname: hostname.to_string(),
            recipient: recipient.to_string(),
            subject: format!("[hostwatch] {} recovered", hostname),
            body: format!(
                "{} is responding again after {} consecutive failed checks.\n",
                hostname, failures
            ),
        }
    }
}

/// Failure-streak state of one host
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PolicyState {
    #[default]
    Up,
    /// Failing but below the threshold; `reasons` holds one entry per failure
    Failing { count: u32, reasons: Vec<String> },
    /// A down notification went out for the current streak
    DownNotified { count: u32 },
}

impl PolicyState {
    pub fn consecutive_failures(&self) -> u32 {
        match self {
            Self::Up => 0,
            Self::Failing { count, .. } | Self::DownNotified { count } => *count,
        }
    }

    pub fn is_down(&self) -> bool {
        matches!(self, Self::DownNotified { .. })
    }
}

/// Pure transition function of the failure/recovery state machine.
///
/// Emits at most one `Down` per unbroken failure streak (on the failure that
/// reaches `threshold`) and one `Recovered` for each streak that was notified.
pub fn transition(
    state: PolicyState,
    outcome: &Outcome,
    threshold: u32,
    hostname: &str,
    recipient: &str,
) -> (PolicyState, Option<Notification>) {
    let threshold = threshold.max(1);

    match (state, outcome) {
        (PolicyState::Up, Outcome::Success { .. }) => (PolicyState::Up, None),
        (PolicyState::Failing { .. }, Outcome::Success { .. }) => (PolicyState::Up, None),
        (PolicyState::DownNotified { count }, Outcome::Success { .. }) => (
            PolicyState::Up,
            Some(Notification::recovered(hostname, recipient, count)),
        ),
        (PolicyState::DownNotified { count }, Outcome::Failure { .. }) => (
            PolicyState::DownNotified {
                count: count.saturating_add(1),
            },
            None,
        ),
        (state, Outcome::Failure { reason, .. }) => {
            let (count, mut reasons) = match state {
                PolicyState::Failing { count, reasons } => (count, reasons),
                _ => (0, Vec::new()),
            };
            let count = count + 1;
            reasons.push(reason.clone());

            if count >= threshold {
                let notification = Notification::down(hostname, recipient, &reasons);
                (PolicyState::DownNotified { count }, Some(notification))
            } else {
                (PolicyState::Failing { count, reasons }, None)
            }
        }
    }
}

/// Per-host notification policy with a fixed threshold
#[derive(Debug, Clone)]
pub struct NotificationPolicy {
    threshold: u32,
    state: PolicyState,
}

impl NotificationPolicy {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            state: PolicyState::Up,
        }
    }

    pub fn state(&self) -> &PolicyState {
        &self.state
    }

    /// Feed one outcome, returning the notification to send if any
    pub fn observe(&mut self, outcome: &Outcome, hostname: &str, recipient: &str) -> Option<Notification> {
        let current = std::mem::take(&mut self.state);
        let (next, notification) = transition(current, outcome, self.threshold, hostname, recipient);
        self.state = next;
        notification
    }
}
