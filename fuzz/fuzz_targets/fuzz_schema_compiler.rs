#![no_main]

use libfuzzer_sys::fuzz_target;
use obs2nc::schema::SchemaDeclaration;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(declaration) = SchemaDeclaration::from_json_str(text) {
            if let Ok(schema) = declaration.compile() {
                if let Some(naming) = schema.naming() {
                    let _ = naming.file_name("2024-03-01 10:00:00");
                }
            }
        }
    }
});
