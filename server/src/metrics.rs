use anyhow::Result;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    transactions: IntCounterVec,
    claims: IntCounter,
    block_height: IntGauge,
}

impl NodeMetrics {
    pub fn new(node_id: &str) -> Result<Self> {
        let registry = Registry::new();
        let transactions = IntCounterVec::new(
            Opts::new("faucet_node_transactions_total", "Transactions by outcome")
                .const_label("node", node_id),
            &["outcome"],
        )?;
        let claims = IntCounter::with_opts(
            Opts::new("faucet_node_claims_total", "Successful faucet claims")
                .const_label("node", node_id),
        )?;
        let block_height = IntGauge::with_opts(
            Opts::new("faucet_node_block_height", "Height of the head block")
                .const_label("node", node_id),
        )?;
        registry.register(Box::new(transactions.clone()))?;
        registry.register(Box::new(claims.clone()))?;
        registry.register(Box::new(block_height.clone()))?;
        Ok(Self {
            registry,
            transactions,
            claims,
            block_height,
        })
    }

    /// `outcome` is one of `committed`, `rejected`, `reverted`.
    pub fn record_tx(&self, outcome: &str) {
        self.transactions.with_label_values(&[outcome]).inc();
    }

    pub fn record_claims(&self, count: u64) {
        self.claims.inc_by(count);
    }

    pub fn set_block_height(&self, height: u64) {
        self.block_height.set(height as i64);
    }

    pub fn render(&self) -> Result<String> {
        let mut buffer = vec![];
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_counters() {
        let metrics = NodeMetrics::new("test").unwrap();
        metrics.record_tx("committed");
        metrics.record_tx("reverted");
        metrics.record_claims(2);
        metrics.set_block_height(7);
        let text = metrics.render().unwrap();
        assert!(text.contains("faucet_node_transactions_total{node=\"test\",outcome=\"committed\"} 1"));
        assert!(text.contains("faucet_node_claims_total{node=\"test\"} 2"));
        assert!(text.contains("faucet_node_block_height{node=\"test\"} 7"));
    }
}
