pub mod staff;
pub mod text;
pub mod view;

pub use staff::{
    key_line, ledger_positions, stem_direction, DurationClass, PlacedNote, StaffLayout,
    StaffRenderer, StemDirection,
};
pub use text::TextStaff;
pub use view::StaffView;
