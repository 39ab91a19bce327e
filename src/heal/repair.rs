use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::adapter::Framework;
use crate::gateway::AiGateway;
use crate::heal::sanitize;

/// Maximum page markup prefix included in the repair prompt
const PAGE_SOURCE_LIMIT: usize = 4000;

/// AI-backed locator repair with retry and exponential backoff.
///
/// Never errors: exhausting the attempt budget returns the failed locator
/// verbatim, which the engine treats as "no repair from this stage".
pub struct AiRepairClient {
    gateway: Arc<dyn AiGateway>,
    max_attempts: u32,
}

impl AiRepairClient {
    pub fn new(gateway: Arc<dyn AiGateway>, max_attempts: u32) -> Self {
        Self { gateway, max_attempts }
    }

    /// Ask the model for a replacement locator.
    ///
    /// Sleeps `2^attempt` seconds after each failed attempt (0-indexed)
    /// while attempts remain. The returned string is sanitized but not
    /// validated; an identity return signals exhaustion.
    pub fn repair(
        &self,
        framework: Framework,
        page_source: &str,
        failed_locator: &str,
        context_hint: &str,
    ) -> String {
        let prompt = build_prompt(framework, page_source, failed_locator, context_hint);

        for attempt in 0..self.max_attempts {
            match self.gateway.ask(&prompt) {
                Ok(response) => return sanitize::clean(&response),
                Err(e) => {
                    log::warn!(
                        "AI repair attempt {}/{} failed: {}",
                        attempt + 1,
                        self.max_attempts,
                        e
                    );
                    if attempt + 1 < self.max_attempts {
                        thread::sleep(Duration::from_secs(backoff_secs(attempt)));
                    }
                }
            }
        }

        failed_locator.to_string()
    }
}

fn build_prompt(
    framework: Framework,
    page_source: &str,
    failed_locator: &str,
    context_hint: &str,
) -> String {
    format!(
        "You are a UI test locator repair assistant.\n\
         A {framework} locator stopped matching any element.\n\n\
         Failed locator: {failed_locator}\n\
         Element description: {context_hint}\n\n\
         Current page HTML (truncated):\n{page}\n\n\
         Respond with exactly one working {framework} locator for the described element.\n\
         No explanation, no markdown, no quotes. Just the locator string.",
        framework = framework,
        failed_locator = failed_locator,
        context_hint = context_hint,
        page = truncate_at_char_boundary(page_source, PAGE_SOURCE_LIMIT),
    )
}

/// Backoff after failed attempt `i` (0-indexed) is `2^i` seconds,
/// saturating so oversized attempt budgets cannot overflow
fn backoff_secs(attempt: u32) -> u64 {
    2u64.saturating_pow(attempt)
}

/// Truncate to at most `limit` bytes without splitting a character
fn truncate_at_char_boundary(s: &str, limit: usize) -> &str {
    if s.len() <= limit {
        return s;
    }
    let mut end = limit;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
