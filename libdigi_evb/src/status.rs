/// Progress report sent from a running readout to whoever is watching it (typically a UI)
#[derive(Debug, Clone, Default)]
pub struct ReadoutStatus {
    pub progress: f32,
    pub built_events: u64,
    pub lost_fragments: u64,
}

impl ReadoutStatus {
    pub fn new(progress: f32, built_events: u64, lost_fragments: u64) -> Self {
        Self {
            progress,
            built_events,
            lost_fragments,
        }
    }
}
