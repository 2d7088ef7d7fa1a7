//! SQL project file assembly.

/// Render the `.sqlproj` as an ordered list of included scripts.
pub fn render_sqlproj(project_name: &str, script_paths: &[String]) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    xml.push_str("<Project DefaultTargets=\"Build\" xmlns=\"http://schemas.microsoft.com/developer/msbuild/2003\">\n");
    xml.push_str("  <PropertyGroup>\n");
    xml.push_str(&format!("    <Name>{}</Name>\n", escape_xml(project_name)));
    xml.push_str("    <DSP>Microsoft.Data.Tools.Schema.Sql.Sql150DatabaseSchemaProvider</DSP>\n");
    xml.push_str("  </PropertyGroup>\n");
    xml.push_str("  <ItemGroup>\n");
    for path in script_paths {
        // msbuild expects backslashes regardless of the emitting platform
        let windows_path = path.replace('/', "\\");
        xml.push_str(&format!(
            "    <Build Include=\"{}\" />\n",
            escape_xml(&windows_path)
        ));
    }
    xml.push_str("  </ItemGroup>\n");
    xml.push_str("</Project>\n");
    xml
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn includes_scripts_in_given_order() {
        let xml = render_sqlproj(
            "OutSystemsModel",
            &[
                "Modules/Sales.Customer.sql".to_string(),
                "Modules/Sales.Order.sql".to_string(),
            ],
        );
        let first = xml.find("Sales.Customer.sql").unwrap();
        let second = xml.find("Sales.Order.sql").unwrap();
        assert!(first < second);
        assert!(xml.contains("<Build Include=\"Modules\\Sales.Customer.sql\" />"));
        assert!(xml.contains("<Name>OutSystemsModel</Name>"));
    }
}
