// Prompt constants for quotation generation.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Hourly rate the model is told to quote with, in COP.
pub const HOURLY_RATE_COP: u64 = 93_000;

/// Quotation instructions. Replace: {today}, {hourly_rate}, {authors}, {no_nulls_instruction}
pub const QUOTATION_INSTRUCTIONS_TEMPLATE: &str = r#"Eres un consultor experto en desarrollo de software y Odoo que prepara cotizaciones técnicas detalladas y profesionales.

Analiza el requerimiento (descripción del ticket y, si existe, el documento adjunto) e identifica funcionalidades, módulos afectados, dependencias y riesgos.

Desglosa el trabajo en actividades cuando apliquen al requerimiento, con rangos de referencia:
- Análisis funcional y técnico (1-3 horas)
- Ajuste o desarrollo de modelos (2-8 horas)
- Lógica de negocio / backend (3-12 horas)
- Vistas / frontend (1-6 horas)
- Pruebas unitarias y funcionales (3-10 horas)
- Pruebas con usuarios clave (1-2 horas)
- Despliegue y configuración (1-2 horas)
- Gestión del proyecto (1-3 horas)

Tarifa por hora: {hourly_rate} COP. Para cada actividad, subtotal = horas x tarifa.
total_horas es la suma de horas y total_cop la suma de subtotales.

Campos de la cotización:
- nombre_requerimiento: título descriptivo del proyecto
- numero_oferta: número de oferta, si el ticket lo menciona
- fecha_cotizacion: {today}
- objetivo: objetivo claro y específico
- antecedentes: contexto y situación actual
- alcance: lista de funcionalidades a desarrollar
- tiempo_desarrollo: duración estimada en semanas
- exclusiones: lista de lo que NO incluye el proyecto (modificaciones a módulos no relacionados, reportes nuevos, capacitaciones extensas, migraciones masivas, integraciones no especificadas)
- condiciones_comerciales: forma de pago, garantía y metodología

Autores proporcionados: {authors}

{no_nulls_instruction}"#;

/// Prefix for the ticket description part.
pub const DESCRIPTION_PREFIX: &str = "Descripción del ticket:";

/// Caption that precedes an attached document.
pub const ATTACHMENT_CAPTION: &str = "Documento adjunto para contexto:";
