//! Business services containing domain logic and use cases.

pub mod clock;
pub mod code_generator;
pub mod identity;
pub mod maintenance;
pub mod phone;
pub mod verification;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use code_generator::{CodeGenerator, OsRngCodeGenerator};
pub use identity::{IdentityClaims, JwtIdentityIssuer};
pub use maintenance::{ExpirySweeper, SweepReport};
pub use phone::{PhoneFormatError, PhoneNormalizer};
pub use verification::{
    AttemptRecord, ChallengeLookup, ChallengeReceipt, ChallengeStore, ConsumeResult,
    DeliveryGateway, DeliveryRequest, IdentityAssertionIssuer, IssuanceRateLimiter,
    VerificationEngine, VerificationEngineConfig,
};
