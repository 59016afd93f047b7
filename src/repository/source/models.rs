use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct StopRow {
    pub stop_id: String,
    pub stop_name: String,
    /// 0 to forbid transfers at the stop; anything else (or absent) allows
    /// them.
    #[serde(default)]
    pub transfer: Option<u8>,
}

/// Walk connection between two stops; each pair appears once, the reverse
/// direction is implied.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferRow {
    pub from_stop_id: String,
    pub to_stop_id: String,
    pub transfer_time_min: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessLinkRow {
    pub taz_id: String,
    pub stop_id: String,
    pub walk_time_min: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleRow {
    pub vehicle_name: String,
    #[serde(default)]
    pub seated_capacity: Option<u32>,
    #[serde(default)]
    pub standing_capacity: Option<u32>,
    #[serde(default)]
    pub dwell_constant: Option<f64>,
    #[serde(default)]
    pub dwell_per_board: Option<f64>,
    #[serde(default)]
    pub dwell_per_alight: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TripRow {
    pub trip_id: String,
    #[serde(default)]
    pub vehicle_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StopTimeRow {
    pub trip_id: String,
    pub stop_id: String,
    /// Starts at 1 and is sequential within a trip.
    pub stop_sequence: u32,
    pub arrival_time: String,
    pub departure_time: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DemandRow {
    pub passenger_id: String,
    pub origin_taz: String,
    pub destination_taz: String,
    /// `outbound` (preferred arrival time) or `inbound` (preferred departure).
    pub direction: String,
    pub preferred_time: String,
}
