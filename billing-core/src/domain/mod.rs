pub mod month;
pub mod payment;
pub mod reading;
pub mod tariff;

pub use month::{BillingMonth, MonthParseError};
pub use payment::{PaymentLookup, PaymentRecord, PaymentStatus, StatusParseError};
pub use reading::{MeterReading, ReadingHistory, RoomReading, Utility};
pub use tariff::{BillEstimate, Tariff};
