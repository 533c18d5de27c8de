use std::future::Future;

use super::request::escalate;
use super::{Completion, CompletionAttempt, CompletionRequest, FinishReason};
use crate::error::Result;

pub const MAX_ATTEMPTS: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Good result, stop here.
    Accept,
    /// Empty or truncated first attempt: reissue with a bigger budget.
    Escalate,
    /// Out of attempts or nothing a bigger budget would fix.
    GiveUp,
}

pub fn decide(attempt_number: u8, completion: &Completion) -> RetryDecision {
    if completion.has_text() && completion.finish_reason == FinishReason::Stop {
        return RetryDecision::Accept;
    }

    let recoverable = !completion.has_text() || completion.finish_reason == FinishReason::Length;
    if recoverable && attempt_number < MAX_ATTEMPTS {
        RetryDecision::Escalate
    } else {
        RetryDecision::GiveUp
    }
}

/// Runs at most two strictly sequential attempts through `send`.
///
/// Transport and HTTP failures end the loop immediately. Otherwise the last
/// attempt is returned even if its text is empty; the extractor decides what
/// that means.
pub async fn run_with_retry<F, Fut>(initial: CompletionRequest, mut send: F) -> Result<CompletionAttempt>
where
    F: FnMut(CompletionRequest) -> Fut,
    Fut: Future<Output = Result<Completion>>,
{
    let mut request = initial;
    let mut attempt_number = 1;

    loop {
        log::debug!(
            "Attempt {}/{} with {} (budget {}, temperature {:?})",
            attempt_number,
            MAX_ATTEMPTS,
            request.model,
            request.output_budget,
            request.temperature
        );

        let completion = send(request.clone()).await?;
        let decision = decide(attempt_number, &completion);

        log::debug!(
            "Attempt {} finished: {:?}, {} chars -> {:?}",
            attempt_number,
            completion.finish_reason,
            completion.content.chars().count(),
            decision
        );

        match decision {
            RetryDecision::Escalate => {
                log::warn!(
                    "Empty or truncated completion from {}, retrying with a larger budget",
                    request.model
                );
                request = escalate(&request);
                attempt_number += 1;
            }
            RetryDecision::Accept | RetryDecision::GiveUp => {
                return Ok(CompletionAttempt {
                    attempt_number,
                    request,
                    completion,
                });
            }
        }
    }
}
