//! Phone Number Lookup Tool
//!
//! Parses an E.164 number and reports validity, region and country code.
//! Carrier and timezone data sets are not shipped with the metadata this
//! tool uses, so those fields are reported as unavailable.

use async_trait::async_trait;
use phonenumber::Mode;

use valet_core::{
    tool::ParameterSchema, Result as CoreResult, Tool, ToolCall, ToolSchema,
};

/// Tool that looks up basic information about a phone number
pub struct PhoneLookupTool;

#[async_trait]
impl Tool for PhoneLookupTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "lookup_phone_number_info".into(),
            description: "Look up basic information about a phone number: validity, region and country code. The input MUST be in E.164 format (e.g. +919876543210).".into(),
            parameters: vec![ParameterSchema::required_string(
                "phone_number",
                "The phone number in full international format",
            )],
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<String> {
        let input = call.str_arg("phone_number").unwrap_or_default();
        Ok(lookup(input))
    }
}

fn lookup(input: &str) -> String {
    let Ok(number) = phonenumber::parse(None, input) else {
        return "ERROR: Invalid phone number format provided. Please use the full international format (e.g., +91...).".into();
    };

    let validity = if phonenumber::is_valid(&number) {
        "Yes"
    } else {
        "No (invalid number length/format)"
    };

    let region = number
        .country()
        .id()
        .map_or_else(|| "Unknown".to_string(), |id| format!("{id:?}"));

    let formatted = number.format().mode(Mode::International).to_string();
    let country_code = number.code().value();

    format!(
        "\n--- Phone Lookup Results ---\
         \nNumber:           {formatted}\
         \nIs Valid:         {validity}\
         \nRegion/Country:   {region}\
         \nCountry Code:     +{country_code}\
         \nCarrier/Provider: N/A\
         \nTimezone(s):      N/A\
         \n--------------------------"
    )
}
