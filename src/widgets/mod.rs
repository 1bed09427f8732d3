//! Built-in widget kinds.

pub mod button;
pub mod checkbox;
pub mod container;
pub mod drag;
pub mod for_each;
pub mod input;
pub mod label;
pub mod number_picker;
pub mod pages;
pub mod plain;
pub mod progress;
pub mod scroll;
pub mod slider;
pub mod spacer;
pub mod text;
pub mod text_area;

pub use button::Button;
pub use checkbox::Checkbox;
pub use container::Container;
pub use drag::{DragArea, DragHandle, Draggable};
pub use for_each::ForEach;
pub use input::{Input, TextInputAction, TextInputType};
pub use label::Label;
pub use number_picker::NumberPicker;
pub use pages::{PageView, TabView};
pub use plain::PlainView;
pub use progress::Progressbar;
pub use scroll::{ScrollArea, Scrollbar};
pub use slider::Slider;
pub use spacer::Spacer;
pub use text::{Text, TextItem};
pub use text_area::TextArea;
