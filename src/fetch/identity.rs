// src/fetch/identity.rs
// Request identity: the user agent a fetch presents.
//
// When a provider answers 403/429/5xx we may try the same page again as a
// different browser. Rotation walks the pool in order, so the next identity
// is always different from the current one.

// Desktop agents first, then mobile
const USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_6) AppleWebKit/605.1.15 \
     (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Linux; Android 14; Pixel 7 Pro) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Mobile Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 \
     (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Identity {
    index: usize,
}

impl Identity {
    pub fn user_agent(&self) -> &'static str {
        USER_AGENTS[self.index % USER_AGENTS.len()]
    }

    pub fn is_mobile(&self) -> bool {
        let agent = self.user_agent();
        agent.contains("Mobile") || agent.contains("Android") || agent.contains("iPhone")
    }

    pub fn rotate(&self) -> Self {
        Self {
            index: (self.index + 1) % USER_AGENTS.len(),
        }
    }
}
