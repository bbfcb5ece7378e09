//! Typed quotation record. Mirrors `quotation::schema` and is used to
//! presence/shape-check normalized model output before rendering.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::errors::AppError;

/// One line of the effort breakdown table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detail {
    pub actividad: String,
    pub horas: u64,
    pub tarifa: u64,
    pub subtotal: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentTime {
    pub detalle: Vec<Detail>,
    pub total_horas: u64,
    pub total_cop: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommercialConditions {
    pub pago: String,
    pub garantia: String,
    pub metodologia: String,
}

/// A list field that becomes bullet text after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListOrText {
    List(Vec<String>),
    Text(String),
}

impl Default for ListOrText {
    fn default() -> Self {
        ListOrText::List(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quotation {
    pub nombre_requerimiento: String,
    pub numero_oferta: String,
    pub fecha_cotizacion: String,
    /// Always replaced by the user's authors input; the model's value is discarded.
    #[serde(default, deserialize_with = "null_as_default")]
    pub autores: Vec<String>,
    pub objetivo: String,
    pub antecedentes: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub alcance: ListOrText,
    pub tiempo_inversion: InvestmentTime,
    pub tiempo_desarrollo: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub exclusiones: ListOrText,
    pub condiciones_comerciales: CommercialConditions,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Quotation {
    /// Shape-checks a normalized record. Unknown keys are ignored.
    pub fn from_record(record: Map<String, Value>) -> Result<Self, AppError> {
        serde_json::from_value(Value::Object(record))
            .map_err(|e| AppError::SchemaMismatch(e.to_string()))
    }
}

impl InvestmentTime {
    /// Lists arithmetic inconsistencies in the effort table.
    ///
    /// The model's numbers are kept as-is; these are reported, never corrected.
    pub fn inconsistencies(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for d in &self.detalle {
            let expected = d.horas.saturating_mul(d.tarifa);
            if d.subtotal != expected {
                issues.push(format!(
                    "'{}': subtotal {} != horas {} x tarifa {} ({expected})",
                    d.actividad, d.subtotal, d.horas, d.tarifa
                ));
            }
        }

        let hours: u64 = self.detalle.iter().map(|d| d.horas).sum();
        if hours != self.total_horas {
            issues.push(format!(
                "total_horas {} != sum of horas {hours}",
                self.total_horas
            ));
        }

        let cop: u64 = self.detalle.iter().map(|d| d.subtotal).sum();
        if cop != self.total_cop {
            issues.push(format!("total_cop {} != sum of subtotal {cop}", self.total_cop));
        }

        issues
    }

    pub fn warn_on_inconsistencies(&self) {
        for issue in self.inconsistencies() {
            warn!("Quotation totals inconsistent: {issue}");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    /// A complete, arithmetically consistent quotation as the model would return it.
    pub(crate) fn model_output() -> Value {
        json!({
            "nombre_requerimiento": "Botón de exportación",
            "numero_oferta": "OF-2024-017",
            "fecha_cotizacion": "2024-05-02",
            "autores": ["ignored"],
            "objetivo": "Permitir exportar pedidos",
            "antecedentes": "Hoy se exporta manualmente",
            "alcance": ["x"],
            "tiempo_inversion": {
                "detalle": [
                    {"actividad": "Análisis", "horas": 2, "tarifa": 93000, "subtotal": 186000},
                    {"actividad": "Desarrollo", "horas": 4, "tarifa": 93000, "subtotal": 372000}
                ],
                "total_horas": 6,
                "total_cop": 558000
            },
            "tiempo_desarrollo": "1 semana",
            "exclusiones": [],
            "condiciones_comerciales": {
                "pago": "50% anticipo",
                "garantia": "3 meses",
                "metodologia": "SCRUM"
            }
        })
    }

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_full_record_deserializes() {
        let q = Quotation::from_record(record(model_output())).unwrap();
        assert_eq!(q.numero_oferta, "OF-2024-017");
        assert_eq!(q.alcance, ListOrText::List(vec!["x".to_string()]));
        assert_eq!(q.tiempo_inversion.detalle.len(), 2);
        assert_eq!(q.condiciones_comerciales.metodologia, "SCRUM");
    }

    #[test]
    fn test_null_list_fields_become_empty() {
        let mut value = model_output();
        value["autores"] = Value::Null;
        value["alcance"] = Value::Null;
        value.as_object_mut().unwrap().remove("exclusiones");

        let q = Quotation::from_record(record(value)).unwrap();
        assert!(q.autores.is_empty());
        assert_eq!(q.alcance, ListOrText::List(vec![]));
        assert_eq!(q.exclusiones, ListOrText::List(vec![]));
    }

    #[test]
    fn test_bullet_text_is_accepted_for_list_fields() {
        let mut value = model_output();
        value["alcance"] = json!("• x");
        let q = Quotation::from_record(record(value)).unwrap();
        assert_eq!(q.alcance, ListOrText::Text("• x".to_string()));
        assert_eq!(serde_json::to_value(&q).unwrap()["alcance"], json!("• x"));
    }

    #[test]
    fn test_missing_required_field_is_schema_mismatch() {
        let mut value = model_output();
        value.as_object_mut().unwrap().remove("condiciones_comerciales");
        let err = Quotation::from_record(record(value)).unwrap_err();
        match err {
            AppError::SchemaMismatch(msg) => assert!(msg.contains("condiciones_comerciales")),
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_hours_rejected() {
        let mut value = model_output();
        value["tiempo_inversion"]["detalle"][0]["horas"] = json!(-1);
        assert!(Quotation::from_record(record(value)).is_err());
    }

    #[test]
    fn test_consistent_totals_report_nothing() {
        let q = Quotation::from_record(record(model_output())).unwrap();
        assert!(q.tiempo_inversion.inconsistencies().is_empty());
    }

    #[test]
    fn test_inconsistent_totals_are_reported_not_fixed() {
        let mut value = model_output();
        value["tiempo_inversion"]["detalle"][0]["subtotal"] = json!(1);
        value["tiempo_inversion"]["total_horas"] = json!(99);

        let q = Quotation::from_record(record(value)).unwrap();
        let issues = q.tiempo_inversion.inconsistencies();
        assert_eq!(issues.len(), 3, "{issues:?}");
        assert_eq!(q.tiempo_inversion.detalle[0].subtotal, 1);
        assert_eq!(q.tiempo_inversion.total_horas, 99);
    }
}
