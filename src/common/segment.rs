/// The eight memory segments addressable by `push` and `pop`.
///
/// Shared vocabulary between the code generator, which emits segment
/// names, and the VM translator, which parses them back in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Segment {
    Argument,
    Local,
    Static,
    Constant,
    This,
    That,
    Pointer,
    Temp,
}
