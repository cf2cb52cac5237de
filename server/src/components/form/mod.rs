use maud::{html, Markup, Render};

const INPUT_CLASSES: &str = "w-full px-4 py-2 border border-gray-300 rounded-lg focus:ring-2 focus:ring-indigo-500 focus:border-indigo-500 text-gray-900";

pub struct InputField {
    pub name: String,
    pub label: Option<String>,
    pub placeholder: Option<String>,
    pub value: Option<String>,
    pub input_type: String,
    pub required: bool,
    pub hidden: bool,
}

impl InputField {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            label: None,
            placeholder: None,
            value: None,
            input_type: "text".to_string(),
            required: false,
            hidden: false,
        }
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn input_type(mut self, input_type: &str) -> Self {
        self.input_type = input_type.to_string();
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }
}

impl Render for InputField {
    fn render(&self) -> Markup {
        if self.hidden {
            return html! {
                input type="hidden" name=(self.name) value=(self.value.as_deref().unwrap_or("")) {}
            };
        }

        html! {
            div class="mb-4" {
                @if let Some(label) = &self.label {
                    label for=(self.name) class="block text-sm font-medium text-gray-700 mb-1" { (label) }
                }

                input
                    type=(self.input_type)
                    name=(self.name)
                    id=(self.name)
                    value=(self.value.as_deref().unwrap_or(""))
                    placeholder=(self.placeholder.as_deref().unwrap_or(""))
                    class=(INPUT_CLASSES)
                    required[self.required] {}
            }
        }
    }
}

pub struct TextArea {
    pub name: String,
    pub label: String,
    pub value: String,
    pub rows: u8,
    pub required: bool,
}

impl TextArea {
    pub fn new(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            value: String::new(),
            rows: 4,
            required: false,
        }
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

impl Render for TextArea {
    fn render(&self) -> Markup {
        html! {
            div class="mb-4" {
                label for=(self.name) class="block text-sm font-medium text-gray-700 mb-1" { (self.label) }
                textarea name=(self.name) id=(self.name) rows=(self.rows) class=(INPUT_CLASSES) required[self.required] {
                    (self.value)
                }
            }
        }
    }
}

/// A stored file reference with an upload input. A chosen file wins over the text value.
pub struct FileField {
    pub name: String,
    pub label: String,
    pub value: String,
    pub preview: Option<String>,
}

impl FileField {
    pub fn new(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            value: String::new(),
            preview: None,
        }
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    pub fn preview(mut self, preview: Option<String>) -> Self {
        self.preview = preview;
        self
    }

    /// Multipart name of the file input paired with `field`
    pub fn file_input_name(field: &str) -> String {
        format!("{field}_file")
    }
}

impl Render for FileField {
    fn render(&self) -> Markup {
        html! {
            div class="mb-4 space-y-2" {
                label for=(self.name) class="block text-sm font-medium text-gray-700" { (self.label) }

                @if let Some(preview) = &self.preview {
                    a href=(preview) target="_blank" class="text-sm text-indigo-600 hover:underline" { "Current file" }
                }

                input type="text" name=(self.name) id=(self.name) value=(self.value)
                    placeholder="URL or storage key" class=(INPUT_CLASSES) {}
                input type="file" name=(Self::file_input_name(&self.name))
                    class="block text-sm text-gray-600 file:mr-3 file:rounded-lg file:border-0 file:bg-indigo-50 file:px-3 file:py-2 file:text-indigo-700" {}
            }
        }
    }
}

pub struct Form {
    pub action: String,
    pub method: String,
    pub content: Box<dyn Render>,
    pub multipart: bool,
    pub confirm: Option<String>,
    pub extra_classes: Option<String>,
}

impl Form {
    pub fn new(action: &str, method: &str, content: impl Render + 'static) -> Self {
        Self {
            action: action.to_string(),
            method: method.to_string(),
            content: Box::new(content),
            multipart: false,
            confirm: None,
            extra_classes: None,
        }
    }

    pub fn multipart(mut self) -> Self {
        self.multipart = true;
        self
    }

    /// Asks the browser for confirmation before submitting (handled by `admin.js`)
    pub fn confirm(mut self, message: &str) -> Self {
        self.confirm = Some(message.to_string());
        self
    }

    pub fn extra_classes(mut self, classes: &str) -> Self {
        self.extra_classes = Some(classes.to_string());
        self
    }
}

impl Render for Form {
    fn render(&self) -> Markup {
        let extra_classes = self.extra_classes.as_deref().unwrap_or("space-y-4");
        let enctype = self.multipart.then_some("multipart/form-data");

        html! {
            form action=(self.action) method=(self.method) class=(extra_classes)
                enctype=[enctype] data-confirm=[self.confirm.as_deref()] {
                (self.content.render())
            }
        }
    }
}

pub struct ToggleSwitch {
    pub name: String,
    pub label: String,
    pub description: Option<String>,
    pub checked: bool,
}

impl ToggleSwitch {
    pub fn new(name: &str, label: &str, checked: bool) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            description: None,
            checked,
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

impl Render for ToggleSwitch {
    fn render(&self) -> Markup {
        html! {
            div class="flex items-center justify-between p-3 mb-4 bg-white rounded-lg border border-gray-200" {
                div {
                    p class="font-medium text-gray-900" { (self.label) }
                    @if let Some(description) = &self.description {
                        p class="text-sm text-gray-500" { (description) }
                    }
                }

                label class="relative inline-flex items-center cursor-pointer" {
                    input type="checkbox" name=(self.name) value="true" checked[self.checked] class="sr-only peer" {}
                    span class="w-11 h-6 bg-gray-200 peer-focus:outline-none peer-focus:ring-4 peer-focus:ring-blue-300 rounded-full peer peer-checked:after:translate-x-full peer-checked:after:border-white after:content-[''] after:absolute after:top-[2px] after:left-[2px] after:bg-white after:border-gray-300 after:border after:rounded-full after:h-5 after:w-5 after:transition-all peer-checked:bg-blue-600" {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multipart_form_has_enctype() {
        let html = Form::new("/admin/projects", "post", html! {})
            .multipart()
            .confirm("Delete?")
            .render()
            .into_string();

        assert!(html.contains(r#"enctype="multipart/form-data""#));
        assert!(html.contains(r#"data-confirm="Delete?""#));
    }

    #[test]
    fn test_plain_form_has_no_enctype() {
        let html = Form::new("/admin/login", "post", html! {}).render().into_string();

        assert!(!html.contains("enctype"));
    }

    #[test]
    fn test_toggle_checked_state() {
        let on = ToggleSwitch::new("isActive", "Active", true).render().into_string();
        let off = ToggleSwitch::new("isActive", "Active", false).render().into_string();

        assert!(on.contains(r#"value="true" checked"#));
        assert!(!off.contains(r#"value="true" checked"#));
    }

    #[test]
    fn test_file_field_input_name() {
        let html = FileField::new("image", "Image").value("projects/1_a.png").render().into_string();

        assert!(html.contains(r#"name="image_file""#));
        assert!(html.contains("projects/1_a.png"));
    }
}
