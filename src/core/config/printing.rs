use crate::core::config::data::Config;

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        print_field("base-url", self.base_url.as_deref());
        print_field("model", self.model.as_deref());
        print_field("api-key-env", self.api_key_env.as_deref());
        print_field("target-language", self.target_language.as_deref());
        match self.markdown {
            Some(true) => println!("  markdown: on"),
            Some(false) => println!("  markdown: off"),
            None => println!("  markdown: (unset)"),
        }
        println!();
        println!("Effective settings:");
        println!("  endpoint: {}", self.effective_base_url());
        println!("  model: {}", self.effective_model());
        println!("  api key from: ${}", self.effective_api_key_env());
        println!("  target language: {}", self.effective_target_language());
    }
}

fn print_field(name: &str, value: Option<&str>) {
    match value {
        Some(value) => println!("  {name}: {value}"),
        None => println!("  {name}: (unset)"),
    }
}
