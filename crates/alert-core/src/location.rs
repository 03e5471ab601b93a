use serde::{Deserialize, Serialize};

/// A subscriber's watched place (spec.md §3).
///
/// `kecamatan` is matched first against a warning's free-text description;
/// `kabupaten` is the fallback match against area names. Either may be empty but not
/// both — the matcher treats an all-empty location as never matching. The `*_code`
/// fields are the administrative codes behind those names (BPS/Kemendagri wilayah
/// codes upstream); `kecamatan_code` is the addressing identity of a location —
/// `locations.kecamatan_code` is unique at the database layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub label: String,
    pub province_code: String,
    pub province: String,
    pub kabupaten_code: String,
    pub kabupaten: String,
    pub kecamatan_code: String,
    pub kecamatan: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub enabled: bool,
}
