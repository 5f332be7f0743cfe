//! NRML exposure-model export
//!
//! Flattens each geocell's taxonomy records into individual asset nodes and
//! serializes an OpenQuake NRML 0.5 exposure document.
//!
//! Asset locations are the centroid of the owning geocell - a deliberate
//! approximation, since individual buildings are not geolocated. With
//! multi-polygon cells the centroid may even fall outside the footprint.

use std::fs;
use std::io;
use std::path::Path;

use geo::Centroid;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::ExportError;
use crate::dictionary::PropertyDictionary;
use crate::metadata::ExposureMetadata;
use crate::model::GeoCell;

/// Default XML namespace of NRML documents.
pub const NRML_NAMESPACE: &str = "http://openquake.org/xmlns/nrml/0.5";

/// GML namespace declared on the NRML root.
pub const GML_NAMESPACE: &str = "http://www.opengis.net/gml";

/// Cost coefficient applied to every structural cost.
///
/// Reserved extension point for spatially varying costs; no current dataset
/// uses anything but 1.0.
pub const DEFAULT_COST_COEFFICIENT: f64 = 1.0;

/// One flattened asset, ready for serialization.
#[derive(Debug, Clone, PartialEq)]
struct AssetNode {
    id: String,
    number: u64,
    taxonomy: String,
    lon: f64,
    lat: f64,
    structural_cost: f64,
    occupants_day: f64,
    occupants_night: f64,
}

/// Exporter for the NRML risk-exposure XML format.
pub struct NrmlExporter<'a> {
    metadata: &'a ExposureMetadata,
    dictionary: &'a PropertyDictionary,
    cost_coefficient: f64,
}

impl<'a> NrmlExporter<'a> {
    /// Creates an exporter with the default cost coefficient.
    pub fn new(metadata: &'a ExposureMetadata, dictionary: &'a PropertyDictionary) -> Self {
        Self {
            metadata,
            dictionary,
            cost_coefficient: DEFAULT_COST_COEFFICIENT,
        }
    }

    /// Overrides the cost coefficient.
    pub fn with_cost_coefficient(mut self, cost_coefficient: f64) -> Self {
        self.cost_coefficient = cost_coefficient;
        self
    }

    /// Renders the result set as a pretty-printed, declaration-prefixed
    /// UTF-8 XML document.
    ///
    /// This performs no I/O; use [`write`](Self::write) to persist.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::TaxonomyLookupMiss`] when a record's taxonomy
    /// has no dictionary row, [`ExportError::NoCentroid`] for a cell with an
    /// empty geometry.
    pub fn render(&self, result: &[GeoCell]) -> Result<String, ExportError> {
        let assets = self.flatten(result)?;
        let bytes = self.serialize(&assets).map_err(ExportError::Xml)?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Renders the result set and writes it to `path`, overwriting any
    /// existing file.
    pub fn write(&self, result: &[GeoCell], path: &Path) -> Result<(), ExportError> {
        let document = self.render(result)?;
        fs::write(path, document).map_err(|source| ExportError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Flattens the result set into asset nodes.
    ///
    /// Cells without exposure records are skipped, as are records with a
    /// non-positive building count. One asset node is produced per remaining
    /// record, so the asset count of the document equals the count of
    /// records with `buildings > 0` across the result.
    fn flatten(&self, result: &[GeoCell]) -> Result<Vec<AssetNode>, ExportError> {
        let mut assets = Vec::new();
        for cell in result {
            if !cell.has_exposure() {
                continue;
            }
            let centroid = cell
                .geometry
                .centroid()
                .ok_or_else(|| ExportError::NoCentroid {
                    cell: cell.id.clone(),
                })?;

            for record in &cell.records {
                if record.buildings <= 0.0 {
                    continue;
                }
                let property = self.dictionary.lookup(&record.taxonomy).ok_or_else(|| {
                    ExportError::TaxonomyLookupMiss {
                        taxonomy: record.taxonomy.clone(),
                    }
                })?;

                assets.push(AssetNode {
                    id: record.id.clone(),
                    number: round_half_up(record.buildings),
                    taxonomy: record.taxonomy.clone(),
                    lon: centroid.x(),
                    lat: centroid.y(),
                    structural_cost: property.avg_struct_cost * self.cost_coefficient,
                    occupants_day: property.nocc_day,
                    occupants_night: property.nocc_night,
                });
            }
        }
        Ok(assets)
    }

    fn serialize(&self, assets: &[AssetNode]) -> io::Result<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut root = BytesStart::new("nrml");
        root.push_attribute(("xmlns", NRML_NAMESPACE));
        root.push_attribute(("xmlns:gml", GML_NAMESPACE));
        writer.write_event(Event::Start(root))?;

        let mut model = BytesStart::new("exposureModel");
        model.push_attribute(("id", self.metadata.id.as_str()));
        model.push_attribute(("category", self.metadata.category.as_str()));
        model.push_attribute(("taxonomySource", self.metadata.taxonomy_source.as_str()));
        writer.write_event(Event::Start(model))?;

        writer.write_event(Event::Start(BytesStart::new("description")))?;
        writer.write_event(Event::Text(BytesText::new(&self.metadata.description)))?;
        writer.write_event(Event::End(BytesEnd::new("description")))?;

        self.serialize_conversions(&mut writer)?;
        self.serialize_assets(&mut writer, assets)?;

        writer.write_event(Event::End(BytesEnd::new("exposureModel")))?;
        writer.write_event(Event::End(BytesEnd::new("nrml")))?;
        Ok(writer.into_inner())
    }

    fn serialize_conversions(&self, writer: &mut Writer<Vec<u8>>) -> io::Result<()> {
        writer.write_event(Event::Start(BytesStart::new("conversions")))?;
        writer.write_event(Event::Start(BytesStart::new("costTypes")))?;

        let mut structural = BytesStart::new("costType");
        structural.push_attribute(("name", "structural"));
        structural.push_attribute(("type", self.metadata.structural.aggregation_type.as_str()));
        structural.push_attribute(("unit", self.metadata.structural.currency.as_str()));
        writer.write_event(Event::Empty(structural))?;

        for (name, declaration) in [
            ("nonstructural", &self.metadata.nonstructural),
            ("contents", &self.metadata.contents),
        ] {
            if let Some(declaration) = declaration {
                let mut cost_type = BytesStart::new("costType");
                cost_type.push_attribute(("name", name));
                cost_type.push_attribute(("type", declaration.aggregation_type.as_str()));
                cost_type.push_attribute(("unit", declaration.currency.as_str()));
                writer.write_event(Event::Empty(cost_type))?;
            }
        }
        writer.write_event(Event::End(BytesEnd::new("costTypes")))?;

        for (name, flag) in [
            ("deductible", self.metadata.deductible_is_absolute),
            ("insuranceLimit", self.metadata.insurance_limit_is_absolute),
        ] {
            if let Some(is_absolute) = flag {
                let mut element = BytesStart::new(name);
                // Lowercase string literal, per the NRML schema.
                element.push_attribute(("isAbsolute", if is_absolute { "true" } else { "false" }));
                writer.write_event(Event::Empty(element))?;
            }
        }

        writer.write_event(Event::End(BytesEnd::new("conversions")))
    }

    fn serialize_assets(
        &self,
        writer: &mut Writer<Vec<u8>>,
        assets: &[AssetNode],
    ) -> io::Result<()> {
        writer.write_event(Event::Start(BytesStart::new("assets")))?;
        for asset in assets {
            let mut node = BytesStart::new("asset");
            node.push_attribute(("id", asset.id.as_str()));
            node.push_attribute(("number", asset.number.to_string().as_str()));
            node.push_attribute(("taxonomy", asset.taxonomy.as_str()));
            writer.write_event(Event::Start(node))?;

            let mut location = BytesStart::new("location");
            location.push_attribute(("lon", fmt_float(asset.lon).as_str()));
            location.push_attribute(("lat", fmt_float(asset.lat).as_str()));
            writer.write_event(Event::Empty(location))?;

            writer.write_event(Event::Start(BytesStart::new("costs")))?;
            let mut cost = BytesStart::new("cost");
            cost.push_attribute(("type", "structural"));
            cost.push_attribute(("value", fmt_float(asset.structural_cost).as_str()));
            writer.write_event(Event::Empty(cost))?;
            writer.write_event(Event::End(BytesEnd::new("costs")))?;

            writer.write_event(Event::Start(BytesStart::new("occupancies")))?;
            for (period, occupants) in [("day", asset.occupants_day), ("night", asset.occupants_night)]
            {
                let mut occupancy = BytesStart::new("occupancy");
                occupancy.push_attribute(("period", period));
                occupancy.push_attribute(("occupants", fmt_float(occupants).as_str()));
                writer.write_event(Event::Empty(occupancy))?;
            }
            writer.write_event(Event::End(BytesEnd::new("occupancies")))?;

            writer.write_event(Event::End(BytesEnd::new("asset")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("assets")))
    }
}

/// Rounds a positive building count half-up to a whole asset number.
///
/// `int(n + 0.5)` semantics: 10.4 -> 10, 10.5 -> 11, 10.9 -> 11. This is
/// NOT banker's rounding.
fn round_half_up(buildings: f64) -> u64 {
    (buildings + 0.5) as u64
}

/// Formats a float the way the downstream engines expect: integral values
/// keep a trailing `.0` (`1000.0`, not `1000`).
fn fmt_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::TaxonomyProperty;
    use crate::metadata::CostDeclaration;
    use crate::model::TaxonomyRecord;
    use geo::{polygon, MultiPolygon};
    use serde_json::Value;

    fn metadata() -> ExposureMetadata {
        ExposureMetadata {
            id: "test_v0.1".into(),
            category: "buildings".into(),
            taxonomy_source: "RIESGOS".into(),
            description: "test valparaiso".into(),
            structural: CostDeclaration {
                aggregation_type: "per_asset".into(),
                currency: "USD".into(),
            },
            nonstructural: None,
            contents: None,
            deductible_is_absolute: None,
            insurance_limit_is_absolute: None,
            taxonomies: vec!["T1".into()],
        }
    }

    fn dictionary() -> PropertyDictionary {
        PropertyDictionary::from_rows(vec![TaxonomyProperty {
            btype: "T1".into(),
            avg_struct_cost: 1000.0,
            nocc_day: 2.5,
            nocc_night: 4.0,
        }])
        .unwrap()
    }

    fn record(id: &str, taxonomy: &str, buildings: f64) -> TaxonomyRecord {
        TaxonomyRecord {
            id: id.into(),
            region: None,
            taxonomy: taxonomy.into(),
            buildings,
            dwellings: None,
            population: None,
            repl_cost: None,
            damage: "D0".into(),
        }
    }

    fn cell(id: &str, records: Vec<TaxonomyRecord>) -> GeoCell {
        // Unit square centred on (0.5, 0.5).
        let ring = polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ];
        GeoCell {
            id: id.into(),
            name: format!("cell {id}"),
            geometry: MultiPolygon(vec![ring]),
            expo: Value::Null,
            records,
        }
    }

    fn asset_count(document: &str) -> usize {
        document.matches("<asset ").count()
    }

    #[test]
    fn test_single_record_worked_example() {
        let meta = metadata();
        let dict = dictionary();
        let cells = vec![cell("c1", vec![record("AREA # 1", "T1", 10.4)])];
        let document = NrmlExporter::new(&meta, &dict).render(&cells).unwrap();

        assert_eq!(asset_count(&document), 1);
        assert!(document.contains(r#"<asset id="AREA # 1" number="10" taxonomy="T1">"#));
        assert!(document.contains(r#"<cost type="structural" value="1000.0"/>"#));
        assert!(document.contains(r#"<location lon="0.5" lat="0.5"/>"#));
        assert!(document.contains(r#"<occupancy period="day" occupants="2.5"/>"#));
        assert!(document.contains(r#"<occupancy period="night" occupants="4.0"/>"#));
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(10.4), 10);
        assert_eq!(round_half_up(10.5), 11);
        assert_eq!(round_half_up(10.9), 11);
        assert_eq!(round_half_up(0.4), 0);
        assert_eq!(round_half_up(1.0), 1);
    }

    #[test]
    fn test_declaration_and_namespaces() {
        let meta = metadata();
        let dict = dictionary();
        let document = NrmlExporter::new(&meta, &dict).render(&[]).unwrap();
        assert!(document.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(document.contains(r#"xmlns="http://openquake.org/xmlns/nrml/0.5""#));
        assert!(document.contains(r#"xmlns:gml="http://www.opengis.net/gml""#));
        assert!(document.contains(r#"<exposureModel id="test_v0.1" category="buildings" taxonomySource="RIESGOS">"#));
        assert!(document.contains("<description>test valparaiso</description>"));
    }

    #[test]
    fn test_zero_building_records_skipped() {
        let meta = metadata();
        let dict = dictionary();
        let cells = vec![cell(
            "c1",
            vec![
                record("a", "T1", 0.0),
                record("b", "T1", 2.0),
                record("c", "T1", -1.0),
            ],
        )];
        let document = NrmlExporter::new(&meta, &dict).render(&cells).unwrap();
        assert_eq!(asset_count(&document), 1);
        assert!(document.contains(r#"<asset id="b""#));
    }

    #[test]
    fn test_cells_without_exposure_skipped() {
        let meta = metadata();
        let dict = dictionary();
        let cells = vec![cell("empty", vec![]), cell("full", vec![record("a", "T1", 1.0)])];
        let document = NrmlExporter::new(&meta, &dict).render(&cells).unwrap();
        assert_eq!(asset_count(&document), 1);
    }

    #[test]
    fn test_asset_count_matches_positive_records() {
        let meta = metadata();
        let dict = dictionary();
        let cells = vec![
            cell("c1", vec![record("a", "T1", 1.5), record("b", "T1", 0.0)]),
            cell("c2", vec![record("c", "T1", 3.0)]),
            cell("c3", vec![]),
        ];
        let document = NrmlExporter::new(&meta, &dict).render(&cells).unwrap();
        let positive = cells
            .iter()
            .flat_map(|c| &c.records)
            .filter(|r| r.buildings > 0.0)
            .count();
        assert_eq!(asset_count(&document), positive);
    }

    #[test]
    fn test_taxonomy_lookup_miss() {
        let meta = metadata();
        let dict = dictionary();
        let cells = vec![cell("c1", vec![record("a", "UNKNOWN", 1.0)])];
        let err = NrmlExporter::new(&meta, &dict).render(&cells).unwrap_err();
        assert!(matches!(err, ExportError::TaxonomyLookupMiss { taxonomy } if taxonomy == "UNKNOWN"));
    }

    #[test]
    fn test_optional_conversions_emitted_when_declared() {
        let mut meta = metadata();
        meta.nonstructural = Some(CostDeclaration {
            aggregation_type: "per_asset".into(),
            currency: "CLP".into(),
        });
        meta.deductible_is_absolute = Some(false);
        meta.insurance_limit_is_absolute = Some(true);
        let dict = dictionary();

        let document = NrmlExporter::new(&meta, &dict).render(&[]).unwrap();
        assert!(document.contains(r#"<costType name="nonstructural" type="per_asset" unit="CLP"/>"#));
        assert!(!document.contains(r#"name="contents""#));
        assert!(document.contains(r#"<deductible isAbsolute="false"/>"#));
        assert!(document.contains(r#"<insuranceLimit isAbsolute="true"/>"#));
    }

    #[test]
    fn test_optional_conversions_absent_by_default() {
        let meta = metadata();
        let dict = dictionary();
        let document = NrmlExporter::new(&meta, &dict).render(&[]).unwrap();
        assert!(!document.contains("nonstructural"));
        assert!(!document.contains("contents"));
        assert!(!document.contains("deductible"));
        assert!(!document.contains("insuranceLimit"));
    }

    #[test]
    fn test_cost_coefficient_scales_structural_cost() {
        let meta = metadata();
        let dict = dictionary();
        let cells = vec![cell("c1", vec![record("a", "T1", 1.0)])];
        let document = NrmlExporter::new(&meta, &dict)
            .with_cost_coefficient(2.0)
            .render(&cells)
            .unwrap();
        assert!(document.contains(r#"value="2000.0""#));
    }

    #[test]
    fn test_write_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xml");
        fs::write(&path, "stale").unwrap();

        let meta = metadata();
        let dict = dictionary();
        NrmlExporter::new(&meta, &dict).write(&[], &path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("<?xml"));
    }
}
