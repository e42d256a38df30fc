fn main() {
    println!("cargo:rerun-if-env-changed=AERA_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=AERA_WIFI_PASS");
    println!("cargo:rerun-if-env-changed=AERA_CONFIG");

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
