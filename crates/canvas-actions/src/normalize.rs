//! Shorthand expansion and repair of common generation mistakes in style and layout objects.
//!
//! Every function here is total: input it does not recognise is left untouched.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Marker the host understands as its free-placement mode.
pub const FREE_PLACEMENT: &str = "smart";

static LENGTH_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:auto|-?(?:\d+(?:\.\d+)?|\.\d+)(?:px|em|rem|%|vw|vh|pt)?)$")
        .expect("length token regex")
});

static IMAGE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:url|(?:repeating-)?(?:linear|radial|conic)-gradient)\((?:[^()]|\([^()]*\))*\)",
    )
    .expect("image token regex")
});

static COLOR_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)#[0-9a-f]{3,8}\b|rgba?\([^)]*\)|hsla?\([^)]*\)").expect("color token regex")
});

/// Alphabetic `background` shorthand words that are not colours.
const BACKGROUND_KEYWORDS: &[&str] = &[
    "auto", "bottom", "center", "contain", "cover", "fixed", "inherit", "initial", "left",
    "local", "none", "right", "round", "scroll", "space", "top", "unset",
];

/// Expands `margin: "a [b [c [d]]]"` into the four longhands and removes `margin`.
///
/// Longhands that are already present win over the shorthand. A bare number applies to all
/// four sides.
pub fn expand_margin(style: &mut Map<String, Value>) {
    let Some(margin) = style.get("margin") else {
        return;
    };
    let sides: [Value; 4] = match margin {
        Value::Number(n) => {
            let v = Value::Number(n.clone());
            [v.clone(), v.clone(), v.clone(), v]
        }
        Value::String(raw) => {
            let tokens = raw.split_whitespace().collect::<Vec<_>>();
            if tokens.is_empty() || tokens.len() > 4 {
                return;
            }
            if !tokens.iter().all(|t| LENGTH_TOKEN.is_match(t)) {
                return;
            }
            let (top, right, bottom, left) = match tokens.as_slice() {
                [all] => (*all, *all, *all, *all),
                [vertical, horizontal] => (*vertical, *horizontal, *vertical, *horizontal),
                [top, horizontal, bottom] => (*top, *horizontal, *bottom, *horizontal),
                [top, right, bottom, left] => (*top, *right, *bottom, *left),
                _ => return,
            };
            [top, right, bottom, left].map(|t| Value::String(t.to_string()))
        }
        _ => return,
    };

    style.remove("margin");
    for (key, value) in ["marginTop", "marginRight", "marginBottom", "marginLeft"]
        .into_iter()
        .zip(sides)
    {
        style.entry(key.to_string()).or_insert(value);
    }
}

/// Decomposes `background` (and image tokens misplaced in `backgroundColor`) into
/// `backgroundColor` / `backgroundImage`.
pub fn resolve_background(style: &mut Map<String, Value>) {
    let misplaced_image = style
        .get("backgroundColor")
        .and_then(Value::as_str)
        .and_then(|color| IMAGE_TOKEN.find(color))
        .map(|m| m.as_str().to_string());

    if let Some(image) = misplaced_image {
        style.insert("backgroundImage".to_string(), Value::String(image));
        style.insert(
            "backgroundColor".to_string(),
            Value::String("transparent".to_string()),
        );
        style.remove("background");
        return;
    }

    let Some(background) = style.remove("background") else {
        return;
    };
    let Some(raw) = background.as_str().map(str::trim) else {
        return;
    };

    if raw.eq_ignore_ascii_case("transparent") || raw.eq_ignore_ascii_case("none") {
        set_background(style, "transparent", "none");
        return;
    }
    if let Some(image) = IMAGE_TOKEN.find(raw) {
        let rest = format!("{} {}", &raw[..image.start()], &raw[image.end()..]);
        let color = color_in(&rest).unwrap_or("transparent");
        set_background(style, color, image.as_str());
        return;
    }
    if let Some(color) = color_in(raw) {
        set_background(style, color, "none");
    }
}

/// First colour in a `background` shorthand: a functional or hex colour, else a keyword.
fn color_in(text: &str) -> Option<&str> {
    if let Some(color) = COLOR_TOKEN.find(text) {
        return Some(color.as_str());
    }
    text.split(|c: char| c.is_whitespace() || c == '/' || c == ',')
        .find(|token| is_color_keyword(token))
}

fn is_color_keyword(token: &str) -> bool {
    !token.is_empty()
        && token.chars().all(|c| c.is_ascii_alphabetic())
        && !BACKGROUND_KEYWORDS
            .iter()
            .any(|keyword| token.eq_ignore_ascii_case(keyword))
}

fn set_background(style: &mut Map<String, Value>, color: &str, image: &str) {
    style.insert(
        "backgroundColor".to_string(),
        Value::String(color.to_string()),
    );
    style.insert(
        "backgroundImage".to_string(),
        Value::String(image.to_string()),
    );
}

/// `display: flex` without a direction defaults to a column; a direction without
/// `display` implies flex.
pub fn infer_flex_axis(params: &mut Map<String, Value>) {
    let display = params
        .get("display")
        .and_then(Value::as_str)
        .map(str::to_string);
    let has_direction = params.contains_key("flexDirection");
    match display.as_deref() {
        Some("flex") if !has_direction => {
            params.insert(
                "flexDirection".to_string(),
                Value::String("column".to_string()),
            );
        }
        None if has_direction && !params.contains_key("display") => {
            params.insert("display".to_string(), Value::String("flex".to_string()));
        }
        _ => {}
    }
}

/// `display: absolute` is not a value the host accepts; it means free placement.
pub fn rewrite_free_placement(value: &mut Map<String, Value>) {
    if value.get("display").and_then(Value::as_str) != Some("absolute") {
        return;
    }
    value.remove("display");
    value.insert(
        "position".to_string(),
        Value::String(FREE_PLACEMENT.to_string()),
    );
}

/// Normalisation applied to layout objects (`setLayout` params, `addChild.layout`).
pub fn normalize_layout(layout: &mut Map<String, Value>) {
    expand_margin(layout);
    rewrite_free_placement(layout);
    infer_flex_axis(layout);
}

/// Normalisation applied to style objects of `doConfig`.
pub fn normalize_style(style: &mut Map<String, Value>) {
    expand_margin(style);
    resolve_background(style);
    rewrite_free_placement(style);
    infer_flex_axis(style);
}

/// Normalisation applied to object values of `doConfig` (layout-like property values).
pub fn normalize_config_value(value: &mut Value) {
    if let Value::Object(map) = value {
        rewrite_free_placement(map);
        infer_flex_axis(map);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object")
    }

    #[test]
    fn margin_two_values_expand_vertical_horizontal() {
        let mut style = obj(json!({"margin": "10px 20px"}));
        expand_margin(&mut style);
        assert_eq!(
            Value::Object(style),
            json!({"marginTop":"10px","marginRight":"20px","marginBottom":"10px","marginLeft":"20px"})
        );
    }

    #[test]
    fn margin_one_three_and_four_values() {
        let mut one = obj(json!({"margin": "8px"}));
        expand_margin(&mut one);
        assert_eq!(one["marginLeft"], json!("8px"));

        let mut three = obj(json!({"margin": "1px 2px 3px"}));
        expand_margin(&mut three);
        assert_eq!(
            Value::Object(three),
            json!({"marginTop":"1px","marginRight":"2px","marginBottom":"3px","marginLeft":"2px"})
        );

        let mut four = obj(json!({"margin": "1px 2px 3px 4px"}));
        expand_margin(&mut four);
        assert_eq!(four["marginRight"], json!("2px"));
        assert_eq!(four["marginLeft"], json!("4px"));
    }

    #[test]
    fn margin_numeric_and_existing_longhand() {
        let mut style = obj(json!({"margin": 12, "marginTop": 0}));
        expand_margin(&mut style);
        assert_eq!(style["marginTop"], json!(0));
        assert_eq!(style["marginBottom"], json!(12));
        assert!(!style.contains_key("margin"));
    }

    #[test]
    fn margin_left_alone_when_not_a_length_list() {
        let mut style = obj(json!({"margin": "calc(100% - 4px)"}));
        expand_margin(&mut style);
        assert_eq!(style["margin"], json!("calc(100% - 4px)"));

        let mut too_many = obj(json!({"margin": "1px 2px 3px 4px 5px"}));
        expand_margin(&mut too_many);
        assert!(too_many.contains_key("margin"));
    }

    #[test]
    fn background_gradient_becomes_image() {
        let mut style = obj(json!({"background": "linear-gradient(180deg,#000,#fff)"}));
        resolve_background(&mut style);
        assert_eq!(
            Value::Object(style),
            json!({"backgroundColor":"transparent","backgroundImage":"linear-gradient(180deg,#000,#fff)"})
        );
    }

    #[test]
    fn background_color_forms() {
        let mut hex = obj(json!({"background": "#ff0000"}));
        resolve_background(&mut hex);
        assert_eq!(
            Value::Object(hex),
            json!({"backgroundColor":"#ff0000","backgroundImage":"none"})
        );

        let mut rgba = obj(json!({"background": "rgba(0, 0, 0, 0.5) no-repeat"}));
        resolve_background(&mut rgba);
        assert_eq!(rgba["backgroundColor"], json!("rgba(0, 0, 0, 0.5)"));

        let mut keyword = obj(json!({"background": "red"}));
        resolve_background(&mut keyword);
        assert_eq!(keyword["backgroundColor"], json!("red"));
        assert_eq!(keyword["backgroundImage"], json!("none"));
    }

    #[test]
    fn background_transparent_and_none() {
        for raw in ["transparent", "none"] {
            let mut style = obj(json!({ "background": raw }));
            resolve_background(&mut style);
            assert_eq!(
                Value::Object(style),
                json!({"backgroundColor":"transparent","backgroundImage":"none"})
            );
        }
    }

    #[test]
    fn background_url_with_trailing_tokens() {
        let mut style = obj(json!({"background": "url(https://a.b/c.png) center/cover"}));
        resolve_background(&mut style);
        assert_eq!(style["backgroundImage"], json!("url(https://a.b/c.png)"));
        assert_eq!(style["backgroundColor"], json!("transparent"));
    }

    #[test]
    fn background_keyword_skips_position_words() {
        let mut style = obj(json!({"background": "center red"}));
        resolve_background(&mut style);
        assert_eq!(
            Value::Object(style),
            json!({"backgroundColor":"red","backgroundImage":"none"})
        );

        let mut positional = obj(json!({"background": "top left / cover"}));
        resolve_background(&mut positional);
        assert!(positional.is_empty());
    }

    #[test]
    fn background_image_keeps_trailing_color() {
        let mut style = obj(json!({"background": "url(a.png) no-repeat center #fafafa"}));
        resolve_background(&mut style);
        assert_eq!(style["backgroundImage"], json!("url(a.png)"));
        assert_eq!(style["backgroundColor"], json!("#fafafa"));

        let mut nested = obj(json!({
            "background": "linear-gradient(90deg, rgba(0,0,0,0.4), #fff) center white"
        }));
        resolve_background(&mut nested);
        assert_eq!(
            nested["backgroundImage"],
            json!("linear-gradient(90deg, rgba(0,0,0,0.4), #fff)")
        );
        assert_eq!(nested["backgroundColor"], json!("white"));
    }

    #[test]
    fn gradient_in_background_color_is_moved() {
        let mut style = obj(json!({
            "backgroundColor": "radial-gradient(circle, #fff, #000)",
            "background": "red"
        }));
        resolve_background(&mut style);
        assert_eq!(
            style["backgroundImage"],
            json!("radial-gradient(circle, #fff, #000)")
        );
        assert_eq!(style["backgroundColor"], json!("transparent"));
        assert!(!style.contains_key("background"));
    }

    #[test]
    fn unrecognised_background_is_dropped() {
        let mut style = obj(json!({"background": 42, "color": "red"}));
        resolve_background(&mut style);
        assert_eq!(Value::Object(style), json!({"color": "red"}));
    }

    #[test]
    fn flex_axis_inference() {
        let mut display_only = obj(json!({"display": "flex"}));
        infer_flex_axis(&mut display_only);
        assert_eq!(display_only["flexDirection"], json!("column"));

        let mut direction_only = obj(json!({"flexDirection": "row"}));
        infer_flex_axis(&mut direction_only);
        assert_eq!(direction_only["display"], json!("flex"));

        let mut block = obj(json!({"display": "block"}));
        infer_flex_axis(&mut block);
        assert!(!block.contains_key("flexDirection"));
    }

    #[test]
    fn absolute_display_becomes_free_placement() {
        let mut value = obj(json!({"display": "absolute", "width": 100}));
        rewrite_free_placement(&mut value);
        assert_eq!(Value::Object(value), json!({"position": "smart", "width": 100}));
    }
}
