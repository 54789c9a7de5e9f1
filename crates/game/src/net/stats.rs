#[derive(Debug, Clone, Default)]
pub struct ReplicationStats {
    pub packets_sent: u64,
    pub packets_delivered: u64,
    pub packets_received: u64,
    pub packets_applied: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub packets_dropped: u64,
    pub packets_duplicated: u64,
    pub packets_reordered: u64,
    pub stale_ignored: u64,
    pub rejected: u64,
}

impl ReplicationStats {
    pub fn merge(&mut self, other: &ReplicationStats) {
        self.packets_sent += other.packets_sent;
        self.packets_delivered += other.packets_delivered;
        self.packets_received += other.packets_received;
        self.packets_applied += other.packets_applied;
        self.bytes_sent += other.bytes_sent;
        self.bytes_received += other.bytes_received;
        self.packets_dropped += other.packets_dropped;
        self.packets_duplicated += other.packets_duplicated;
        self.packets_reordered += other.packets_reordered;
        self.stale_ignored += other.stale_ignored;
        self.rejected += other.rejected;
    }
}
