pub mod seat;

pub use seat::{HolderId, NewSeat, Seat, SeatLockView, SeatStatus};
