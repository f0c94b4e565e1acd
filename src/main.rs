fn main() -> Result<(), Box<dyn std::error::Error>> {
    ai_translate::cli::main()
}
