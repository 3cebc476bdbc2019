// Record retention: bounded rolling window and unbounded historical log
use super::telemetry::DerivedRecord;
use std::collections::VecDeque;
use std::sync::Arc;

/// Points kept on the live chart.
pub const WINDOW_CAPACITY: usize = 20;

/// Fixed-capacity FIFO of the most recent records.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    records: VecDeque<Arc<DerivedRecord>>,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: VecDeque::with_capacity(capacity + 1),
        }
    }

    /// Append at the tail, returning the evicted head if the window was full.
    pub fn push(&mut self, record: Arc<DerivedRecord>) -> Option<Arc<DerivedRecord>> {
        self.records.push_back(record);
        if self.records.len() > self.capacity {
            self.records.pop_front()
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<DerivedRecord>> {
        self.records.iter()
    }
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self::new(WINDOW_CAPACITY)
    }
}

/// Every record of the session, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct HistoricalLog {
    records: Vec<Arc<DerivedRecord>>,
}

impl HistoricalLog {
    pub fn push(&mut self, record: Arc<DerivedRecord>) {
        self.records.push(record);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Arc<DerivedRecord>] {
        &self.records
    }
}

/// Both retention policies fed from a single append.
#[derive(Debug, Clone, Default)]
pub struct RecordBuffers {
    window: RollingWindow,
    log: HistoricalLog,
}

impl RecordBuffers {
    pub fn append(&mut self, record: Arc<DerivedRecord>) {
        self.log.push(Arc::clone(&record));
        self.window.push(record);
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.log.clear();
    }

    pub fn window(&self) -> &RollingWindow {
        &self.window
    }

    pub fn log(&self) -> &HistoricalLog {
        &self.log
    }

    pub fn window_snapshot(&self) -> Vec<Arc<DerivedRecord>> {
        self.window.iter().cloned().collect()
    }

    pub fn log_snapshot(&self) -> Vec<Arc<DerivedRecord>> {
        self.log.records().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(rpm: f64) -> Arc<DerivedRecord> {
        Arc::new(DerivedRecord {
            timestamp: Utc::now(),
            commanded_throttle: 1000,
            thrust: 0.0,
            voltage: 0.0,
            current: 0.0,
            power: 0.0,
            rpm,
            efficiency: 0.0,
        })
    }

    fn rpms(records: &[Arc<DerivedRecord>]) -> Vec<f64> {
        records.iter().map(|r| r.rpm).collect()
    }

    #[test]
    fn test_window_never_exceeds_capacity() {
        let mut window = RollingWindow::default();
        for i in 0..100 {
            window.push(record(i as f64));
            assert!(window.len() <= WINDOW_CAPACITY);
        }
        assert_eq!(window.len(), WINDOW_CAPACITY);
    }

    #[test]
    fn test_window_evicts_head_first() {
        let mut window = RollingWindow::default();
        for i in 0..20 {
            assert!(window.push(record(i as f64)).is_none());
        }
        let second = window.iter().nth(1).map(|r| r.rpm);

        let evicted = window.push(record(20.0));

        assert_eq!(evicted.map(|r| r.rpm), Some(0.0));
        assert_eq!(window.iter().next().map(|r| r.rpm), second);
        assert_eq!(window.iter().last().map(|r| r.rpm), Some(20.0));
    }

    #[test]
    fn test_log_unaffected_by_eviction() {
        let mut buffers = RecordBuffers::default();
        for i in 0..25 {
            buffers.append(record(i as f64));
            assert_eq!(buffers.log().len(), i + 1);
        }

        assert_eq!(buffers.window().len(), 20);
        assert_eq!(rpms(&buffers.log_snapshot()), (0..25).map(|i| i as f64).collect::<Vec<_>>());
        assert_eq!(rpms(&buffers.window_snapshot())[0], 5.0);
    }

    #[test]
    fn test_buffers_share_records() {
        let mut buffers = RecordBuffers::default();
        buffers.append(record(1.0));

        let in_window = buffers.window_snapshot();
        let in_log = buffers.log_snapshot();
        assert!(Arc::ptr_eq(&in_window[0], &in_log[0]));
    }

    #[test]
    fn test_reset_empties_both() {
        let mut buffers = RecordBuffers::default();
        for i in 0..25 {
            buffers.append(record(i as f64));
        }
        buffers.reset();

        assert!(buffers.window().is_empty());
        assert!(buffers.log().is_empty());
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut window = RollingWindow::new(0);
        window.push(record(1.0));
        window.push(record(2.0));
        assert_eq!(window.capacity(), 1);
        assert_eq!(window.iter().next().map(|r| r.rpm), Some(2.0));
    }
}
