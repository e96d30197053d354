use crate::columns::{aliases, has_column};
use crate::types::DataShape;

/// Decides which domain shape a header set represents.
///
/// Municipality codes take precedence over state columns, which take
/// precedence over coordinates.
pub fn classify<S: AsRef<str>>(headers: &[S]) -> DataShape {
    if has_column(headers, aliases::IBGE_CODE) {
        DataShape::MunicipalityChoropleth
    } else if has_column(headers, aliases::STATE) {
        DataShape::StateChoropleth
    } else {
        DataShape::Coordinates
    }
}
