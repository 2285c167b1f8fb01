//! Radio Link Constants

/// Radio channel used by fixed-channel deployments.
///
/// Both gateway and nodes pin to the station's access-point channel so the
/// peer link and the uplink can coexist on one radio.
pub const FIXED_CHANNEL: u8 = 6;

/// Channel number meaning "whatever channel the station interface is on".
pub const FOLLOW_STATION_CHANNEL: u8 = 0;

/// Highest valid 2.4 GHz channel number.
pub const MAX_CHANNEL: u8 = 14;

/// Largest payload the peer-to-peer link delivers in one frame (bytes).
pub const MAX_FRAME_LEN: usize = 250;

/// Length of a link-layer peer address (bytes).
pub const PEER_ADDRESS_LEN: usize = 6;
