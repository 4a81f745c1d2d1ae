use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use vetflow::flows::{
    CollaboratorError, DiscoverySpec, PhaseSpec, ProposeContext, Proposer, SourceProducer,
};
use vetflow::item::Item;
use vetflow::runtimes::RuntimeConfig;

/// Producer returning a canned fragment, optionally after a delay so tests
/// can scramble branch completion order.
pub struct StubProducer {
    pub name: &'static str,
    pub delay_ms: u64,
}

#[async_trait]
impl SourceProducer for StubProducer {
    async fn collect(&self) -> Result<Value, CollaboratorError> {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
        Ok(json!({
            "source": self.name,
            "content": format!("{} material", self.name),
        }))
    }
}

/// Producer that always fails, for degradation tests.
pub struct FailingProducer;

#[async_trait]
impl SourceProducer for FailingProducer {
    async fn collect(&self) -> Result<Value, CollaboratorError> {
        Err(CollaboratorError::msg("source system unreachable"))
    }
}

/// Proposer returning `count` numbered items per call and counting calls.
pub struct ScriptedProposer {
    pub prefix: &'static str,
    pub count: usize,
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Proposer for ScriptedProposer {
    async fn propose(&self, _ctx: ProposeContext) -> Result<Vec<Item>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((1..=self.count)
            .map(|i| Item::new(&format!("{} {i}", self.prefix)))
            .collect())
    }
}

/// Call counters for the two scripted proposers.
pub struct SpecHandles {
    pub needs_calls: Arc<AtomicUsize>,
    pub opportunities_calls: Arc<AtomicUsize>,
}

pub fn standard_producers(delays: [u64; 3]) -> Vec<(String, Arc<dyn SourceProducer>)> {
    let names = ["interviews", "workshops", "artifacts"];
    names
        .into_iter()
        .zip(delays)
        .map(|(name, delay_ms)| {
            (
                name.to_string(),
                Arc::new(StubProducer { name, delay_ms }) as Arc<dyn SourceProducer>,
            )
        })
        .collect()
}

/// Spec with scripted collaborators: both phases propose six candidates per
/// cycle under the given threshold and iteration budget.
pub fn scripted_spec(accept_threshold: usize, max_iterations: u32) -> (DiscoverySpec, SpecHandles) {
    scripted_spec_with_producers(
        accept_threshold,
        max_iterations,
        standard_producers([0, 0, 0]),
    )
}

pub fn scripted_spec_with_producers(
    accept_threshold: usize,
    max_iterations: u32,
    producers: Vec<(String, Arc<dyn SourceProducer>)>,
) -> (DiscoverySpec, SpecHandles) {
    let needs_calls = Arc::new(AtomicUsize::new(0));
    let opportunities_calls = Arc::new(AtomicUsize::new(0));
    let spec = DiscoverySpec {
        producers,
        needs: PhaseSpec::new("needs")
            .with_accept_threshold(accept_threshold)
            .with_max_iterations(max_iterations),
        opportunities: PhaseSpec::new("opportunities")
            .with_accept_threshold(accept_threshold)
            .with_max_iterations(max_iterations),
        needs_proposer: Arc::new(ScriptedProposer {
            prefix: "Need",
            count: 6,
            calls: needs_calls.clone(),
        }),
        opportunities_proposer: Arc::new(ScriptedProposer {
            prefix: "Opportunity",
            count: 6,
            calls: opportunities_calls.clone(),
        }),
        runtime: RuntimeConfig::default(),
    };
    (
        spec,
        SpecHandles {
            needs_calls,
            opportunities_calls,
        },
    )
}

pub fn items(titles: &[&str]) -> Vec<Item> {
    titles.iter().map(|title| Item::new(title)).collect()
}
