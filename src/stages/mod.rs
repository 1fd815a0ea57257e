pub mod stage0_parse;
pub mod stage1_respondent;
pub mod stage2_submit;

pub use stage0_parse::*;
pub use stage1_respondent::*;
pub use stage2_submit::*;
