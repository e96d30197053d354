use crate::classify::classify;
use crate::columns::{aliases, match_column};
use crate::data::{Cell, Sheet};
use crate::error::{MapError, Result};
use crate::regions::normalize_state_key;
use crate::types::{
    DataShape, Dataset, MunicipalityAggregate, PointRecord, Records, StateAggregate,
};

const IBGE_CODE_WIDTH: usize = 7;

/// Actual header names resolved for each logical field of a shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Columns {
    Coordinates {
        latitude: String,
        longitude: String,
        description: String,
        quantity: Option<String>,
    },
    State {
        state: String,
        quantity: String,
    },
    Municipality {
        code: String,
        value: String,
    },
}

impl Columns {
    pub fn shape(&self) -> DataShape {
        match self {
            Columns::Coordinates { .. } => DataShape::Coordinates,
            Columns::State { .. } => DataShape::StateChoropleth,
            Columns::Municipality { .. } => DataShape::MunicipalityChoropleth,
        }
    }

    /// (logical field, header) pairs, for reporting.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        match self {
            Columns::Coordinates {
                latitude,
                longitude,
                description,
                quantity,
            } => {
                let mut fields = vec![
                    ("latitude", latitude.as_str()),
                    ("longitude", longitude.as_str()),
                    ("description", description.as_str()),
                ];
                if let Some(q) = quantity {
                    fields.push(("quantity", q.as_str()));
                }
                fields
            }
            Columns::State { state, quantity } => {
                vec![("state", state.as_str()), ("quantity", quantity.as_str())]
            }
            Columns::Municipality { code, value } => {
                vec![("ibge_code", code.as_str()), ("value", value.as_str())]
            }
        }
    }
}

fn require(headers: &[String], field: &'static str, aliases: &[&str]) -> Result<String> {
    match_column(headers, aliases)
        .map(str::to_string)
        .ok_or_else(|| MapError::Schema {
            field,
            available: headers.to_vec(),
        })
}

/// Resolves the columns a shape needs, failing on the first missing one.
pub fn resolve_columns(headers: &[String], shape: DataShape) -> Result<Columns> {
    Ok(match shape {
        DataShape::Coordinates => Columns::Coordinates {
            latitude: require(headers, "latitude", aliases::LATITUDE)?,
            longitude: require(headers, "longitude", aliases::LONGITUDE)?,
            description: require(headers, "description", aliases::DESCRIPTION)?,
            quantity: match_column(headers, aliases::POINT_QUANTITY).map(str::to_string),
        },
        DataShape::StateChoropleth => Columns::State {
            state: require(headers, "state", aliases::STATE)?,
            quantity: require(headers, "quantity", aliases::STATE_QUANTITY)?,
        },
        DataShape::MunicipalityChoropleth => Columns::Municipality {
            code: require(headers, "ibge_code", aliases::IBGE_CODE)?,
            value: require(headers, "value", aliases::MUNICIPALITY_VALUE)?,
        },
    })
}

/// Classifies the sheet and runs the matching cleaning pipeline.
pub fn normalize(sheet: &Sheet) -> Result<Dataset> {
    let shape = classify(sheet.headers());
    let columns = resolve_columns(sheet.headers(), shape)?;
    clean(sheet, &columns)
}

/// Runs the cleaning pipeline for already-resolved columns.
pub fn clean(sheet: &Sheet, columns: &Columns) -> Result<Dataset> {
    let shape = columns.shape();
    let (records, has_quantity) = match columns {
        Columns::Coordinates {
            latitude,
            longitude,
            description,
            quantity,
        } => {
            let points = clean_points(sheet, latitude, longitude, description, quantity.as_deref());
            let has_quantity = quantity.is_some() && points.iter().any(|p| p.quantity.is_some());
            (Records::Points(points), has_quantity)
        }
        Columns::State { state, quantity } => {
            (Records::States(clean_states(sheet, state, quantity)), true)
        }
        Columns::Municipality { code, value } => (
            Records::Municipalities(clean_municipalities(sheet, code, value)),
            true,
        ),
    };

    if records.is_empty() {
        return Err(MapError::EmptyDataset { shape });
    }

    Ok(Dataset {
        shape,
        records,
        has_quantity,
    })
}

/// Yields the cells of `columns` for every row where none of them is null.
fn complete_rows<'a>(
    sheet: &'a Sheet,
    columns: &'a [&'a str],
) -> impl Iterator<Item = Vec<&'a Cell>> + 'a {
    (0..sheet.rows().len()).filter_map(move |row| {
        let cells: Vec<&Cell> = columns.iter().map(|c| sheet.get(row, c)).collect();
        cells.iter().all(|c| !c.is_empty()).then_some(cells)
    })
}

fn clean_points(
    sheet: &Sheet,
    latitude: &str,
    longitude: &str,
    description: &str,
    quantity: Option<&str>,
) -> Vec<PointRecord> {
    let mut columns = vec![latitude, longitude, description];
    columns.extend(quantity);

    complete_rows(sheet, &columns)
        .filter_map(|cells| {
            let lat = cells[0].as_f64().filter(|v| (-90.0..=90.0).contains(v))?;
            let lon = cells[1].as_f64().filter(|v| (-180.0..=180.0).contains(v))?;
            let description = cells[2].as_text()?;
            let quantity = match cells.get(3) {
                // Zero and negative weights are invalid, not zero-weight.
                Some(cell) => Some(cell.as_f64().filter(|q| *q > 0.0)?),
                None => None,
            };
            Some(PointRecord {
                latitude: lat,
                longitude: lon,
                description,
                quantity,
            })
        })
        .collect()
}

fn clean_states(sheet: &Sheet, state: &str, quantity: &str) -> Vec<StateAggregate> {
    let columns = [state, quantity];
    complete_rows(sheet, &columns)
        .filter_map(|cells| {
            let state_name_raw = cells[0].as_text()?;
            let quantity = cells[1].as_f64().filter(|q| *q >= 0.0)?;
            Some(StateAggregate {
                state_key_normalized: normalize_state_key(&state_name_raw),
                state_name_raw,
                quantity,
            })
        })
        .collect()
}

fn clean_municipalities(sheet: &Sheet, code: &str, value: &str) -> Vec<MunicipalityAggregate> {
    let columns = [code, value];
    complete_rows(sheet, &columns)
        .filter_map(|cells| {
            let ibge_code = pad_ibge_code(&cells[0].as_text()?);
            let value = cells[1].as_f64().filter(|v| *v >= 0.0)?;
            Some(MunicipalityAggregate { ibge_code, value })
        })
        .collect()
}

/// Left-fills a municipality code with zeros to seven characters. Longer
/// codes are left untouched.
pub fn pad_ibge_code(code: &str) -> String {
    format!("{:0>width$}", code.trim(), width = IBGE_CODE_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(headers: &[&str], rows: Vec<Vec<Cell>>) -> Sheet {
        Sheet::new(headers.iter().map(|h| h.to_string()).collect(), rows)
    }

    fn num(n: f64) -> Cell {
        Cell::Number(n)
    }

    fn text(s: &str) -> Cell {
        Cell::from_text(s)
    }

    #[test]
    fn test_pad_ibge_code() {
        assert_eq!(pad_ibge_code("3550308"), "3550308");
        assert_eq!(pad_ibge_code("3550"), "0003550");
        assert_eq!(pad_ibge_code(" 12 "), "0000012");
        assert_eq!(pad_ibge_code("123456789"), "123456789");
    }

    #[test]
    fn test_coordinates_with_quantity() {
        let s = sheet(
            &["lat", "lon", "nome", "populacao", "peso"],
            vec![vec![num(-23.55), num(-46.64), text("São Paulo"), num(1.0), num(12400000.0)]],
        );
        let dataset = normalize(&s).unwrap();
        assert_eq!(dataset.shape, DataShape::Coordinates);
        assert!(dataset.has_quantity);
        let Records::Points(points) = &dataset.records else {
            panic!("expected points");
        };
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].quantity, Some(12400000.0));
        assert_eq!(points[0].description, "São Paulo");
    }

    #[test]
    fn test_out_of_range_coordinates_dropped() {
        let s = sheet(
            &["latitude", "longitude", "descricao"],
            vec![
                vec![num(91.0), num(0.0), text("a")],
                vec![num(-90.0), num(180.0), text("b")],
                vec![num(0.0), num(-180.5), text("c")],
                vec![text("north"), num(0.0), text("d")],
            ],
        );
        let dataset = normalize(&s).unwrap();
        assert!(!dataset.has_quantity);
        let Records::Points(points) = &dataset.records else {
            panic!("expected points");
        };
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].description, "b");
        for p in points {
            assert!((-90.0..=90.0).contains(&p.latitude));
            assert!((-180.0..=180.0).contains(&p.longitude));
        }
    }

    #[test]
    fn test_point_quantity_must_be_positive() {
        let s = sheet(
            &["lat", "lon", "name", "quantidade"],
            vec![
                vec![num(1.0), num(1.0), text("zero"), num(0.0)],
                vec![num(1.0), num(1.0), text("neg"), num(-3.0)],
                vec![num(1.0), num(1.0), text("nan"), text("n/a")],
                vec![num(1.0), num(1.0), text("null"), Cell::Empty],
                vec![num(1.0), num(1.0), text("ok"), text("5")],
            ],
        );
        let dataset = normalize(&s).unwrap();
        let Records::Points(points) = &dataset.records else {
            panic!("expected points");
        };
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].description, "ok");
        assert_eq!(points[0].quantity, Some(5.0));
    }

    #[test]
    fn test_missing_coordinate_column_lists_headers() {
        let s = sheet(&["lat", "nome"], vec![]);
        match normalize(&s).unwrap_err() {
            MapError::Schema { field, available } => {
                assert_eq!(field, "longitude");
                assert_eq!(available, vec!["lat".to_string(), "nome".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_all_rows_rejected_is_empty_dataset() {
        let s = sheet(
            &["lat", "lon", "nome"],
            vec![vec![num(200.0), num(0.0), text("x")], vec![num(200.0), num(1.0), text("y")]],
        );
        assert!(matches!(
            normalize(&s).unwrap_err(),
            MapError::EmptyDataset {
                shape: DataShape::Coordinates
            }
        ));
    }

    #[test]
    fn test_states_allow_zero_and_normalize_key() {
        let s = sheet(
            &["Estado", "Quantidade"],
            vec![
                vec![text(" São Paulo "), num(0.0)],
                vec![text("Bahia"), num(-1.0)],
                vec![text("Ceará"), text("abc")],
                vec![Cell::Empty, num(3.0)],
            ],
        );
        let dataset = normalize(&s).unwrap();
        assert_eq!(dataset.shape, DataShape::StateChoropleth);
        assert!(dataset.has_quantity);
        let Records::States(states) = &dataset.records else {
            panic!("expected states");
        };
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].state_name_raw, " São Paulo ");
        assert_eq!(states[0].state_key_normalized, "sao paulo");
        assert_eq!(states[0].quantity, 0.0);
    }

    #[test]
    fn test_state_quantity_required() {
        let s = sheet(&["uf", "total"], vec![vec![text("SP"), num(1.0)]]);
        assert!(matches!(
            normalize(&s).unwrap_err(),
            MapError::Schema {
                field: "quantity",
                ..
            }
        ));
    }

    #[test]
    fn test_municipality_codes_padded() {
        let s = sheet(
            &["codigo_ibge", "valor"],
            vec![
                vec![num(3550308.0), num(100.0)],
                vec![num(3550.0), num(5.0)],
                vec![text("1100205"), num(-2.0)],
            ],
        );
        let dataset = normalize(&s).unwrap();
        assert_eq!(dataset.shape, DataShape::MunicipalityChoropleth);
        let Records::Municipalities(rows) = &dataset.records else {
            panic!("expected municipalities");
        };
        let codes: Vec<&str> = rows.iter().map(|r| r.ibge_code.as_str()).collect();
        assert_eq!(codes, ["3550308", "0003550"]);
    }

    #[test]
    fn test_municipality_value_required() {
        let s = sheet(&["ibge", "nome"], vec![vec![num(1.0), text("x")]]);
        let err = normalize(&s).unwrap_err();
        assert!(err.to_string().contains("'value'"));
    }

    #[test]
    fn test_resolved_fields_for_reporting() {
        let headers: Vec<String> = ["LAT", "Longitude", "Titulo"].iter().map(|s| s.to_string()).collect();
        let columns = resolve_columns(&headers, DataShape::Coordinates).unwrap();
        assert_eq!(
            columns.fields(),
            vec![("latitude", "LAT"), ("longitude", "Longitude"), ("description", "Titulo")]
        );
    }
}
