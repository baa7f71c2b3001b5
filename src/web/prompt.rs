use std::path::Path;

use label_forge_types::{LabelRequest, RescaleRequest};
use minijinja::{context, Environment, Error};

// Paths are substituted as-is: a quote inside a path ends up inside the quoted
// literal the model sees.
const APPLY_LABEL_TEMPLATE: &str = r#"
Write a Blender Python script that:
1. Imports the 3D model from '{{ model_path }}'
2. Scales the model so its Z height is exactly {{ model_height_mm }} mm ({{ model_height_m }} meters)
3. Imports the label image from '{{ label_path }}'
4. UV unwraps the front face and applies the label image as a texture
5. The label must be sized to exactly {{ label_width_mm }} mm wide by {{ label_height_mm }} mm high
6. Render the result to '{{ render_path }}'
7. Export the model as a GLB to '{{ export_path }}'

Ensure the script works in headless (background) Blender mode and uses mm-to-meter conversion.
"#;

const RESCALE_TEMPLATE: &str = r#"
Write a Blender Python script that:
1. Imports the 3D model from '{{ model_path }}'
2. Measures the model's bounding box
3. Scales the model so its bounding box is exactly {{ width_mm }} mm wide (X), {{ depth_mm }} mm deep (Y) and {{ height_mm }} mm high (Z) ({{ width_m }} x {{ depth_m }} x {{ height_m }} meters)
4. Applies the scale transform so the mesh data carries the new size
5. Saves the scene as a .blend file to '{{ blend_path }}'

Ensure the script works in headless (background) Blender mode and uses mm-to-meter conversion.
"#;

/// Render a millimeter value without a trailing `.0` when it is whole.
pub fn format_mm(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

// Via whole micrometers: dividing mm by 1000 directly gives 33.3 -> 0.033299999999999996
fn format_m(value_mm: f64) -> String {
    let micrometers = (value_mm * 1000.0).round();
    format!("{}", micrometers / 1_000_000.0)
}

fn render(name: &'static str, source: &'static str, ctx: minijinja::Value) -> Result<String, Error> {
    let mut env = Environment::new();
    env.add_template(name, source)?;
    let template = env.get_template(name)?;
    template.render(ctx)
}

/// Prompt asking for a script that applies a label at an exact physical size.
pub fn compose_label_prompt(
    model_path: &Path,
    label_path: &Path,
    request: &LabelRequest,
    render_path: &Path,
    export_path: &Path,
) -> Result<String, Error> {
    render(
        "apply_label",
        APPLY_LABEL_TEMPLATE,
        context! {
            model_path => model_path.display().to_string(),
            label_path => label_path.display().to_string(),
            label_width_mm => format_mm(request.width_mm()),
            label_height_mm => format_mm(request.height_mm()),
            model_height_mm => format_mm(request.model_height_mm()),
            model_height_m => format_m(request.model_height_mm()),
            render_path => render_path.display().to_string(),
            export_path => export_path.display().to_string(),
        },
    )
}

/// Prompt asking for a script that rescales a model to a target bounding box.
pub fn compose_rescale_prompt(
    model_path: &Path,
    request: &RescaleRequest,
    blend_path: &Path,
) -> Result<String, Error> {
    render(
        "rescale",
        RESCALE_TEMPLATE,
        context! {
            model_path => model_path.display().to_string(),
            width_mm => format_mm(request.width_mm()),
            depth_mm => format_mm(request.depth_mm()),
            height_mm => format_mm(request.height_mm()),
            width_m => format_m(request.width_mm()),
            depth_m => format_m(request.depth_mm()),
            height_m => format_m(request.height_mm()),
            blend_path => blend_path.display().to_string(),
        },
    )
}
