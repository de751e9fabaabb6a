use std::path::{Path, PathBuf};

use chrono::NaiveDate;

/// Consultation-boundary organization used by the shipped query templates.
pub const DEFAULT_BOUNDARY_ORG: &str = "Maa-nulth First Nations";

/// Reporting window covering `[Sep 1 of year-1, Aug 31 of year]`, inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportingWindow {
    /// First eligible date (September 1 of the prior year).
    pub start: NaiveDate,
    /// Last eligible date (August 31 of the reporting year).
    pub end: NaiveDate,
}

impl ReportingWindow {
    /// Build the window for a reporting year.
    ///
    /// The fiscal window never lands on an invalid calendar date, so this is
    /// total for any year chrono can represent.
    pub fn for_year(year: i32) -> Self {
        let start = NaiveDate::from_ymd_opt(year - 1, 9, 1).unwrap_or(NaiveDate::MIN);
        let end = NaiveDate::from_ymd_opt(year, 8, 31).unwrap_or(NaiveDate::MAX);
        Self { start, end }
    }

    /// Whether `date` falls inside the window (inclusive on both ends).
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Top-level run configuration.
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// Reporting year (window is Sep 1 of `year - 1` through Aug 31 of `year`).
    pub year: i32,
    /// Organization attribute used to filter the consultation boundary layer.
    pub boundary_org: String,
    /// Path to the per-organization boundary layer (GeoJSON).
    pub org_layer: PathBuf,
    /// Directory receiving the workbook and per-type GeoJSON files.
    pub out_dir: PathBuf,
    /// Prefix used in output file names.
    pub file_prefix: String,
    /// EPSG code of the source geometry reference frame.
    pub source_epsg: u32,
}

impl RunConfig {
    /// Create a config for a reporting year and output directory.
    pub fn new(year: i32, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            year,
            boundary_org: DEFAULT_BOUNDARY_ORG.to_string(),
            org_layer: PathBuf::new(),
            out_dir: out_dir.into(),
            file_prefix: "maanulth".to_string(),
            source_epsg: 3005,
        }
    }

    /// Override the consultation-boundary organization filter.
    pub fn with_boundary_org(mut self, org: impl Into<String>) -> Self {
        self.boundary_org = org.into();
        self
    }

    /// Set the per-organization boundary layer path.
    pub fn with_org_layer(mut self, path: impl Into<PathBuf>) -> Self {
        self.org_layer = path.into();
        self
    }

    /// Override the output file-name prefix.
    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    /// The reporting window for this run.
    pub fn window(&self) -> ReportingWindow {
        ReportingWindow::for_year(self.year)
    }

    /// Workbook path for this run.
    pub fn workbook_path(&self) -> PathBuf {
        self.out_dir.join(format!(
            "{}_annual_reporting_tables_{}.xlsx",
            self.file_prefix, self.year
        ))
    }

    /// GeoJSON path for one record-type tag.
    pub fn spatial_path(&self, key: &str) -> PathBuf {
        self.out_dir
            .join(format!("{}_{}_{}_shapes.geojson", self.file_prefix, key, self.year))
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new(2024, Path::new("."))
    }
}
