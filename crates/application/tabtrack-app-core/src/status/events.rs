use tabtrack_pipeline::DeliveryReport;

#[derive(Debug, Clone)]
pub enum StatusEvent {
    /// Settings were re-read.
    Refreshed { configured: bool },

    Delivery(DeliveryReport),
}
