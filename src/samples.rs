//! Downloadable example spreadsheets, one per data shape.

use rust_xlsxwriter::{Format, Workbook, XlsxError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    Coordinates,
    States,
    Municipalities,
}

impl SampleKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "coordinates" | "coordenadas" | "pontos" => Some(SampleKind::Coordinates),
            "states" | "estados" => Some(SampleKind::States),
            "municipalities" | "municipios" => Some(SampleKind::Municipalities),
            _ => None,
        }
    }

    /// Name offered to the browser when downloading.
    pub fn download_name(&self) -> &'static str {
        match self {
            SampleKind::Coordinates => "exemplo_coordenadas.xlsx",
            SampleKind::States => "exemplo_estados_brasil.xlsx",
            SampleKind::Municipalities => "exemplo_municipios_brasil.xlsx",
        }
    }
}

/// Ten capitals with approximate populations.
const CITIES: &[(f64, f64, &str, f64)] = &[
    (-15.7934, -47.8828, "Brasília", 3_050_000.0),
    (-22.9068, -43.1729, "Rio de Janeiro", 6_750_000.0),
    (-23.5558, -46.6396, "São Paulo", 12_400_000.0),
    (-12.9714, -38.5014, "Salvador", 2_900_000.0),
    (-8.0476, -34.8770, "Recife", 1_650_000.0),
    (-19.9167, -43.9345, "Belo Horizonte", 2_530_000.0),
    (-25.4284, -49.2733, "Curitiba", 1_950_000.0),
    (-30.0346, -51.2177, "Porto Alegre", 1_490_000.0),
    (-3.7319, -38.5267, "Fortaleza", 2_700_000.0),
    (-3.1190, -60.0217, "Manaus", 2_250_000.0),
];

const STATES: &[(&str, f64)] = &[
    ("Acre", 906_876.0),
    ("Alagoas", 3_365_351.0),
    ("Amapá", 877_613.0),
    ("Amazonas", 4_269_995.0),
    ("Bahia", 14_985_284.0),
    ("Ceará", 9_240_580.0),
    ("Distrito Federal", 3_094_325.0),
    ("Espírito Santo", 4_108_508.0),
    ("Goiás", 7_206_589.0),
    ("Maranhão", 7_153_262.0),
    ("Mato Grosso", 3_567_234.0),
    ("Mato Grosso do Sul", 2_839_188.0),
    ("Minas Gerais", 21_411_923.0),
    ("Pará", 8_777_124.0),
    ("Paraíba", 4_059_905.0),
    ("Paraná", 11_597_484.0),
    ("Pernambuco", 9_674_793.0),
    ("Piauí", 3_289_290.0),
    ("Rio de Janeiro", 17_463_349.0),
    ("Rio Grande do Norte", 3_560_903.0),
    ("Rio Grande do Sul", 11_466_630.0),
    ("Rondônia", 1_815_278.0),
    ("Roraima", 652_713.0),
    ("Santa Catarina", 7_338_473.0),
    ("São Paulo", 46_649_132.0),
    ("Sergipe", 2_338_474.0),
    ("Tocantins", 1_607_363.0),
];

const MUNICIPALITIES: &[(&str, f64)] = &[
    ("1100205", 100_000.0),
    ("1100809", 30_000.0),
    ("1100023", 60_000.0),
    ("3550308", 12_400_000.0),
    ("3304557", 6_750_000.0),
    ("5300108", 3_050_000.0),
    ("2927408", 2_900_000.0),
    ("2611606", 1_650_000.0),
    ("3106200", 2_530_000.0),
    ("4106902", 1_950_000.0),
];

/// Builds the sample workbook for `kind` in memory.
pub fn workbook_bytes(kind: SampleKind) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();

    match kind {
        SampleKind::Coordinates => {
            for (col, header) in ["latitude", "longitude", "descricao", "quantidade"]
                .iter()
                .enumerate()
            {
                sheet.write_string_with_format(0, col as u16, *header, &bold)?;
            }
            for (i, (lat, lon, name, quantity)) in CITIES.iter().enumerate() {
                let row = i as u32 + 1;
                sheet.write_number(row, 0, *lat)?;
                sheet.write_number(row, 1, *lon)?;
                sheet.write_string(row, 2, *name)?;
                sheet.write_number(row, 3, *quantity)?;
            }
        }
        SampleKind::States => {
            sheet.write_string_with_format(0, 0, "estado", &bold)?;
            sheet.write_string_with_format(0, 1, "quantidade", &bold)?;
            for (i, (name, quantity)) in STATES.iter().enumerate() {
                let row = i as u32 + 1;
                sheet.write_string(row, 0, *name)?;
                sheet.write_number(row, 1, *quantity)?;
            }
        }
        SampleKind::Municipalities => {
            sheet.write_string_with_format(0, 0, "codigo_ibge", &bold)?;
            sheet.write_string_with_format(0, 1, "valor", &bold)?;
            // Codes stay text so leading zeros survive spreadsheet editors.
            for (i, (code, value)) in MUNICIPALITIES.iter().enumerate() {
                let row = i as u32 + 1;
                sheet.write_string(row, 0, *code)?;
                sheet.write_number(row, 1, *value)?;
            }
        }
    }

    workbook.save_to_buffer()
}
