pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_SIGNALING_URL: &str = "ws://localhost:3001";
pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
