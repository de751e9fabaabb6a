/// Stable natural key for an authorization/feature record.
/// Examples: `A12345 67`, `S23986`, `REC1234 5`
pub type MapLabel = String;
/// Landscape-unit name from the administrative-unit layer.
/// Examples: `Nahmint`, `Effingham`
pub type UnitName = String;
/// Organization name attached to a per-organization boundary polygon.
/// Examples: `Huu-ay-aht First Nations`, `Toquaht Nation`
pub type OrgName = String;
/// Output/report column name.
/// Examples: `MAP_LABEL`, `LANDSCAPE_UNIT`, `IHA_ID`
pub type ColumnName = String;
/// Important-harvest-area overlap identifier from the secondary layer.
/// Example: `42`
pub type SecondaryId = i64;
